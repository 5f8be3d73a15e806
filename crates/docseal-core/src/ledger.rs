//! # Ledger Collaborator
//!
//! The ledger owns certificate records and profiles and enforces every
//! state-transition rule (who may register, issue, invalidate). DocSeal only
//! reads from it and requests mutations through it.
//!
//! ## Reads and Writes
//!
//! Reads (`get_*`, `verify_certificate`, listings) are idempotent and safe
//! to retry. Writes are split into a one-shot submission returning a
//! [`TxHash`] and a separate [`Ledger::transaction_status`] poll, so a
//! caller can wait for confirmation without ever resubmitting an accepted
//! transaction.
//!
//! ## Accounts
//!
//! A handle acts as one signing account ([`Ledger::account`]). Switching
//! accounts notifies subscribers registered through
//! [`Ledger::on_account_changed`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::certificate::CertificateRecord;
use crate::content::ContentReference;
use crate::digest::ContentDigest;
use crate::events::{AccountHandler, Subscription};
use crate::identity::{Address, CertificateId};
use crate::profile::Profile;

/// Identifier of a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Wrap a transaction hash as reported by the ledger.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Return the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Confirmation state of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TxStatus {
    /// Accepted but not yet included.
    Pending,
    /// Included and applied.
    Confirmed,
    /// Included but reverted by the ledger's rules.
    Reverted {
        /// Revert reason reported by the ledger.
        reason: String,
    },
}

/// Registration flags of the current account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    /// Registered in any role.
    pub registered: bool,
    /// Registered as a student.
    pub user: bool,
    /// Registered as an issuer.
    pub issuer: bool,
}

/// Errors from ledger calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The call failed in a way that may succeed on retry (node congestion,
    /// rate limit, dropped connection, transaction not yet confirmed).
    #[error("ledger call {operation} failed transiently: {message}")]
    Transient {
        /// The ledger operation.
        operation: String,
        /// What went wrong.
        message: String,
    },

    /// The ledger explicitly refused the call (e.g. caller is not an issuer).
    #[error("ledger rejected {operation}: {reason}")]
    Rejected {
        /// The ledger operation.
        operation: String,
        /// Reason reported by the ledger.
        reason: String,
    },

    /// The ledger answered with something that could not be understood.
    #[error("ledger protocol error in {operation}: {message}")]
    Protocol {
        /// The ledger operation.
        operation: String,
        /// What could not be decoded.
        message: String,
    },
}

impl LedgerError {
    /// Build a [`LedgerError::Transient`].
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Build a [`LedgerError::Rejected`].
    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`LedgerError::Protocol`].
    pub fn protocol(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// The ledger operations DocSeal consumes.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` across request handlers. The trait is object-safe.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// The account this handle signs and reads as.
    fn account(&self) -> Address;

    /// Act as a different account from now on and notify subscribers.
    fn switch_account(&self, account: Address);

    /// Register a handler for account switches.
    fn on_account_changed(&self, handler: AccountHandler) -> Subscription;

    /// Registration flags of the current account.
    async fn account_status(&self) -> Result<AccountStatus, LedgerError>;

    /// Whether the current account is registered in any role.
    async fn is_registered(&self) -> Result<bool, LedgerError> {
        Ok(self.account_status().await?.registered)
    }

    /// Whether the current account is a registered student.
    async fn is_user(&self) -> Result<bool, LedgerError> {
        Ok(self.account_status().await?.user)
    }

    /// Whether the current account is a registered issuer.
    async fn is_issuer(&self) -> Result<bool, LedgerError> {
        Ok(self.account_status().await?.issuer)
    }

    /// Profile of the current account, `None` if unregistered.
    async fn get_profile(&self) -> Result<Option<Profile>, LedgerError>;

    /// Profile of any account, `None` if unregistered.
    async fn get_profile_by_address(&self, address: &Address) -> Result<Option<Profile>, LedgerError>;

    /// Submit a student registration for the current account.
    async fn submit_register_user(&self, name: &str) -> Result<TxHash, LedgerError>;

    /// Submit an issuer registration for the current account.
    async fn submit_register_issuer(&self, name: &str) -> Result<TxHash, LedgerError>;

    /// Submit a certificate issued by the current account.
    async fn submit_issue_certificate(
        &self,
        name: &str,
        student: &Address,
        id: &CertificateId,
        digest: &ContentDigest,
        content_reference: &ContentReference,
    ) -> Result<TxHash, LedgerError>;

    /// Submit an invalidation of a certificate issued by the current account.
    async fn submit_invalidate_certificate(&self, id: &CertificateId) -> Result<TxHash, LedgerError>;

    /// Poll the confirmation state of a submitted transaction.
    async fn transaction_status(&self, tx: &TxHash) -> Result<TxStatus, LedgerError>;

    /// Look up a certificate, `None` if it was never issued.
    async fn get_certificate(&self, id: &CertificateId) -> Result<Option<CertificateRecord>, LedgerError>;

    /// Authoritative authenticity check: the record exists, every field
    /// matches, and it is still valid.
    async fn verify_certificate(
        &self,
        id: &CertificateId,
        issuer: &Address,
        student: &Address,
        digest: &ContentDigest,
    ) -> Result<bool, LedgerError>;

    /// Certificates issued to `student`, oldest first.
    async fn certificates_issued_for(&self, student: &Address) -> Result<Vec<CertificateId>, LedgerError>;

    /// Certificates issued by `issuer`, oldest first.
    async fn certificates_issued_by(&self, issuer: &Address) -> Result<Vec<CertificateId>, LedgerError>;
}
