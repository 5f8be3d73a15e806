//! # Certificate Records
//!
//! The ledger-resident entity describing one issued certificate.
//!
//! ## Lifecycle
//!
//! ```text
//! Nonexistent ──issue──▶ Valid ──invalidate (issuer only)──▶ Invalid
//! ```
//!
//! The transition to `Invalid` is one-way. There is no path back to
//! `Valid`, and a record cannot be created already invalid. Every field other
//! than the validity flag is immutable after creation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentReference;
use crate::digest::ContentDigest;
use crate::identity::{Address, CertificateId};

/// Validity state of a certificate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateStatus {
    /// Issued and not revoked.
    Valid,
    /// Revoked by its issuer. Terminal.
    Invalid,
}

/// Rejected lifecycle transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The certificate was already invalidated.
    #[error("certificate {0} is already invalid")]
    AlreadyInvalid(CertificateId),

    /// Only the recorded issuer may invalidate.
    #[error("{caller} is not the issuer of certificate {id}")]
    NotIssuer {
        /// The certificate.
        id: CertificateId,
        /// The account that attempted the transition.
        caller: Address,
    },
}

/// A certificate as recorded on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// Human-readable certificate name (e.g. "BSc Computer Science").
    pub name: String,
    /// The issuing account.
    pub issuer_address: Address,
    /// The student the certificate was issued to.
    pub user_address: Address,
    /// Ledger lookup key, also rendered into the document.
    #[serde(rename = "uuid")]
    pub id: CertificateId,
    /// Where the embedded document was published.
    pub content_reference: ContentReference,
    /// SHA-256 of the embedded document.
    pub digest: ContentDigest,
    /// Cleared exactly once, by invalidation.
    pub is_valid: bool,
}

impl CertificateRecord {
    /// Create a freshly issued (valid) record.
    pub fn issued(
        name: impl Into<String>,
        issuer_address: Address,
        user_address: Address,
        id: CertificateId,
        content_reference: ContentReference,
        digest: ContentDigest,
    ) -> Self {
        Self {
            name: name.into(),
            issuer_address,
            user_address,
            id,
            content_reference,
            digest,
            is_valid: true,
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> CertificateStatus {
        if self.is_valid {
            CertificateStatus::Valid
        } else {
            CertificateStatus::Invalid
        }
    }

    /// Apply the `Valid → Invalid` transition on behalf of `caller`.
    pub fn invalidate(&mut self, caller: &Address) -> Result<(), TransitionError> {
        if caller != &self.issuer_address {
            return Err(TransitionError::NotIssuer {
                id: self.id,
                caller: caller.clone(),
            });
        }
        match self.status() {
            CertificateStatus::Invalid => Err(TransitionError::AlreadyInvalid(self.id)),
            CertificateStatus::Valid => {
                self.is_valid = false;
                Ok(())
            }
        }
    }

    /// Whether `candidate` is the issuer of this certificate.
    pub fn is_issued_by(&self, candidate: &Address) -> bool {
        &self.issuer_address == candidate
    }

    /// Whether `candidate` is the student this certificate was issued to.
    pub fn is_issued_to(&self, candidate: &Address) -> bool {
        &self.user_address == candidate
    }
}
