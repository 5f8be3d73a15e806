//! In-process [`Ledger`] over a shared [`LedgerBook`].

use std::sync::Arc;

use async_trait::async_trait;
use docseal_core::{
    AccountEvents, AccountHandler, AccountStatus, Address, CertificateId, CertificateRecord,
    ContentDigest, ContentReference, Ledger, LedgerError, Profile, Subscription, TxHash, TxStatus,
};
use parking_lot::RwLock;

use crate::book::{LedgerBook, RuleViolation};

/// A ledger handle acting as one account.
///
/// Handles created with [`MemoryLedger::connect`] share the book, so an
/// issuer handle and a student handle see the same certificates.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    book: Arc<LedgerBook>,
    account: Arc<RwLock<Address>>,
    events: Arc<AccountEvents>,
}

impl MemoryLedger {
    /// A fresh, empty ledger acting as `account`.
    pub fn new(account: Address) -> Self {
        Self::with_book(Arc::new(LedgerBook::new()), account)
    }

    /// A handle on an existing book.
    pub fn with_book(book: Arc<LedgerBook>, account: Address) -> Self {
        Self {
            book,
            account: Arc::new(RwLock::new(account)),
            events: Arc::new(AccountEvents::new()),
        }
    }

    /// Another handle on the same book, acting as `account`.
    pub fn connect(&self, account: Address) -> Self {
        Self::with_book(Arc::clone(&self.book), account)
    }

    /// The shared book, for fault injection and direct inspection.
    pub fn book(&self) -> &Arc<LedgerBook> {
        &self.book
    }

    fn caller(&self) -> Address {
        self.account.read().clone()
    }
}

fn rejected(operation: &str, violation: RuleViolation) -> LedgerError {
    LedgerError::rejected(operation, violation.to_string())
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn account(&self) -> Address {
        self.caller()
    }

    fn switch_account(&self, account: Address) {
        *self.account.write() = account.clone();
        self.events.emit(&account);
    }

    fn on_account_changed(&self, handler: AccountHandler) -> Subscription {
        self.events.subscribe(handler)
    }

    async fn account_status(&self) -> Result<AccountStatus, LedgerError> {
        self.book.take_fault("accountStatus")?;
        Ok(self.book.status(&self.caller()))
    }

    async fn get_profile(&self) -> Result<Option<Profile>, LedgerError> {
        self.book.take_fault("getProfile")?;
        Ok(self.book.profile(&self.caller()))
    }

    async fn get_profile_by_address(&self, address: &Address) -> Result<Option<Profile>, LedgerError> {
        self.book.take_fault("getProfileByAddress")?;
        Ok(self.book.profile(address))
    }

    async fn submit_register_user(&self, name: &str) -> Result<TxHash, LedgerError> {
        self.book.take_fault("registerUser")?;
        let tx = self
            .book
            .register_user(&self.caller(), name)
            .map_err(|v| rejected("registerUser", v))?;
        self.book.deliver_receipt("registerUser", tx)
    }

    async fn submit_register_issuer(&self, name: &str) -> Result<TxHash, LedgerError> {
        self.book.take_fault("registerIssuer")?;
        let tx = self
            .book
            .register_issuer(&self.caller(), name)
            .map_err(|v| rejected("registerIssuer", v))?;
        self.book.deliver_receipt("registerIssuer", tx)
    }

    async fn submit_issue_certificate(
        &self,
        name: &str,
        student: &Address,
        id: &CertificateId,
        digest: &ContentDigest,
        content_reference: &ContentReference,
    ) -> Result<TxHash, LedgerError> {
        self.book.take_fault("issueCertificate")?;
        let tx = self
            .book
            .issue(&self.caller(), name, student, id, digest, content_reference)
            .map_err(|v| rejected("issueCertificate", v))?;
        self.book.deliver_receipt("issueCertificate", tx)
    }

    async fn submit_invalidate_certificate(&self, id: &CertificateId) -> Result<TxHash, LedgerError> {
        self.book.take_fault("invalidateCertificate")?;
        let tx = self
            .book
            .invalidate(&self.caller(), id)
            .map_err(|v| rejected("invalidateCertificate", v))?;
        self.book.deliver_receipt("invalidateCertificate", tx)
    }

    async fn transaction_status(&self, tx: &TxHash) -> Result<TxStatus, LedgerError> {
        self.book.take_fault("transactionStatus")?;
        self.book
            .transaction_status(tx)
            .ok_or_else(|| LedgerError::rejected("transactionStatus", format!("unknown transaction {tx}")))
    }

    async fn get_certificate(&self, id: &CertificateId) -> Result<Option<CertificateRecord>, LedgerError> {
        self.book.take_fault("getCertificate")?;
        Ok(self.book.certificate(id))
    }

    async fn verify_certificate(
        &self,
        id: &CertificateId,
        issuer: &Address,
        student: &Address,
        digest: &ContentDigest,
    ) -> Result<bool, LedgerError> {
        self.book.take_fault("verifyCertificate")?;
        Ok(self.book.verify(id, issuer, student, digest))
    }

    async fn certificates_issued_for(&self, student: &Address) -> Result<Vec<CertificateId>, LedgerError> {
        self.book.take_fault("getCertificatesIssuedFor")?;
        Ok(self.book.issued_for(student))
    }

    async fn certificates_issued_by(&self, issuer: &Address) -> Result<Vec<CertificateId>, LedgerError> {
        self.book.take_fault("getCertificatesIssuedBy")?;
        Ok(self.book.issued_by(issuer))
    }
}
