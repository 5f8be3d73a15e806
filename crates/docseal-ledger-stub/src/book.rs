//! The ledger's state and the rules every mutation must satisfy.
//!
//! | Operation | Rule |
//! |-----------|------|
//! | register user / issuer | caller not yet registered, name non-empty |
//! | issue | caller is an issuer, student is a registered user, uuid unused |
//! | invalidate | certificate exists, caller is its issuer, still valid |
//! | verify | record exists, issuer, student and digest match, still valid |
//!
//! Writes return a transaction hash. Rule violations are refused up front,
//! the way a node refuses a transaction whose gas estimation reverts.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use docseal_core::{
    AccountStatus, Address, CertificateId, CertificateRecord, ContentDigest, ContentReference,
    LedgerError, Profile, Role, TransitionError, TxHash, TxStatus,
};
use thiserror::Error;

/// A refused mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// The account already has a profile.
    #[error("account {0} is already registered")]
    AlreadyRegistered(Address),

    /// Registration without a name.
    #[error("name must not be empty")]
    EmptyName,

    /// The zero address cannot act.
    #[error("no account selected")]
    NoAccount,

    /// Only issuers may issue.
    #[error("{0} is not a registered issuer")]
    NotIssuer(Address),

    /// Certificates are issued to registered users only.
    #[error("{0} is not a registered user")]
    StudentNotRegistered(Address),

    /// The uuid is taken.
    #[error("certificate {0} already exists")]
    DuplicateCertificate(CertificateId),

    /// No such certificate.
    #[error("certificate {0} does not exist")]
    UnknownCertificate(CertificateId),

    /// Invalidation refused by the record's lifecycle.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl RuleViolation {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            Self::EmptyName => "VALIDATION_ERROR",
            Self::NoAccount => "NO_ACCOUNT",
            Self::NotIssuer(_) => "NOT_ISSUER",
            Self::StudentNotRegistered(_) => "STUDENT_NOT_REGISTERED",
            Self::DuplicateCertificate(_) => "DUPLICATE_CERTIFICATE",
            Self::UnknownCertificate(_) => "NOT_FOUND",
            Self::Transition(TransitionError::AlreadyInvalid(_)) => "ALREADY_INVALID",
            Self::Transition(TransitionError::NotIssuer { .. }) => "NOT_CERTIFICATE_ISSUER",
        }
    }
}

#[derive(Debug)]
struct TxEntry {
    status: TxStatus,
    /// Polls left before a confirmed transaction reports `Confirmed`.
    pending_polls: u32,
}

/// Shared ledger state. All handles on one book see the same data.
#[derive(Debug, Default)]
pub struct LedgerBook {
    profiles: DashMap<Address, Profile>,
    certificates: DashMap<CertificateId, CertificateRecord>,
    issued_by: DashMap<Address, Vec<CertificateId>>,
    issued_for: DashMap<Address, Vec<CertificateId>>,
    transactions: DashMap<TxHash, TxEntry>,
    tx_counter: AtomicU64,
    transient_faults: AtomicU32,
    reverts: AtomicU32,
    lost_receipts: AtomicU32,
    confirmation_polls: AtomicU32,
}

impl LedgerBook {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Fault injection ----------------------------------------------------

    /// Fail the next `n` calls with a transient error.
    pub fn fail_next_calls(&self, n: u32) {
        self.transient_faults.store(n, Ordering::SeqCst);
    }

    /// Accept the next `n` submissions but revert them without effect.
    pub fn revert_next_submissions(&self, n: u32) {
        self.reverts.store(n, Ordering::SeqCst);
    }

    /// Apply the next `n` accepted submissions but fail their responses
    /// with a transient error, as if the gateway's reply was lost.
    pub fn lose_next_receipts(&self, n: u32) {
        self.lost_receipts.store(n, Ordering::SeqCst);
    }

    /// Report new transactions as pending for `n` polls before confirming.
    pub fn set_confirmation_polls(&self, n: u32) {
        self.confirmation_polls.store(n, Ordering::SeqCst);
    }

    /// Consume one injected transient fault, if any.
    pub fn take_fault(&self, operation: &str) -> Result<(), LedgerError> {
        if take_one(&self.transient_faults) {
            tracing::debug!(operation, "injected transient ledger fault");
            return Err(LedgerError::transient(operation, "injected fault: node unavailable"));
        }
        Ok(())
    }

    /// Hand back the receipt of an accepted submission, unless it is lost.
    pub fn deliver_receipt(&self, operation: &str, tx: TxHash) -> Result<TxHash, LedgerError> {
        if take_one(&self.lost_receipts) {
            tracing::debug!(operation, tx = %tx, "injected lost receipt");
            return Err(LedgerError::transient(operation, "injected fault: response lost"));
        }
        Ok(tx)
    }

    // -- Reads --------------------------------------------------------------

    /// Profile of `address`, if registered.
    pub fn profile(&self, address: &Address) -> Option<Profile> {
        self.profiles.get(address).map(|p| p.value().clone())
    }

    /// Registration flags of `address`.
    pub fn status(&self, address: &Address) -> AccountStatus {
        match self.profiles.get(address).map(|p| p.role) {
            Some(Role::User) => AccountStatus {
                registered: true,
                user: true,
                issuer: false,
            },
            Some(Role::Issuer) => AccountStatus {
                registered: true,
                user: false,
                issuer: true,
            },
            _ => AccountStatus::default(),
        }
    }

    /// Look up a certificate.
    pub fn certificate(&self, id: &CertificateId) -> Option<CertificateRecord> {
        self.certificates.get(id).map(|r| r.value().clone())
    }

    /// Whether the record exists, matches every field, and is still valid.
    pub fn verify(
        &self,
        id: &CertificateId,
        issuer: &Address,
        student: &Address,
        digest: &ContentDigest,
    ) -> bool {
        self.certificates.get(id).is_some_and(|r| {
            // Evaluate every comparison so timing does not reveal which failed.
            let digest_ok = r.digest.ct_matches(digest);
            let issuer_ok = r.is_issued_by(issuer);
            let student_ok = r.is_issued_to(student);
            digest_ok & issuer_ok & student_ok & r.is_valid
        })
    }

    /// Certificates issued by `issuer`, oldest first.
    pub fn issued_by(&self, issuer: &Address) -> Vec<CertificateId> {
        self.issued_by
            .get(issuer)
            .map(|ids| ids.value().clone())
            .unwrap_or_default()
    }

    /// Certificates issued to `student`, oldest first.
    pub fn issued_for(&self, student: &Address) -> Vec<CertificateId> {
        self.issued_for
            .get(student)
            .map(|ids| ids.value().clone())
            .unwrap_or_default()
    }

    /// Confirmation state of a transaction. Unknown hashes are `None`.
    pub fn transaction_status(&self, tx: &TxHash) -> Option<TxStatus> {
        let mut entry = self.transactions.get_mut(tx)?;
        if entry.pending_polls > 0 {
            entry.pending_polls -= 1;
            return Some(TxStatus::Pending);
        }
        Some(entry.status.clone())
    }

    // -- Writes -------------------------------------------------------------

    /// Register `caller` as a student.
    pub fn register_user(&self, caller: &Address, name: &str) -> Result<TxHash, RuleViolation> {
        self.submit(|| self.register(caller, name, Role::User))
    }

    /// Register `caller` as an issuer.
    pub fn register_issuer(&self, caller: &Address, name: &str) -> Result<TxHash, RuleViolation> {
        self.submit(|| self.register(caller, name, Role::Issuer))
    }

    /// Issue a certificate from `caller` to `student`.
    pub fn issue(
        &self,
        caller: &Address,
        name: &str,
        student: &Address,
        id: &CertificateId,
        digest: &ContentDigest,
        content_reference: &ContentReference,
    ) -> Result<TxHash, RuleViolation> {
        self.submit(|| {
            if !self.status(caller).issuer {
                return Err(RuleViolation::NotIssuer(caller.clone()));
            }
            if !self.status(student).user {
                return Err(RuleViolation::StudentNotRegistered(student.clone()));
            }
            match self.certificates.entry(*id) {
                Entry::Occupied(_) => Err(RuleViolation::DuplicateCertificate(*id)),
                Entry::Vacant(slot) => {
                    slot.insert(CertificateRecord::issued(
                        name,
                        caller.clone(),
                        student.clone(),
                        *id,
                        content_reference.clone(),
                        *digest,
                    ));
                    self.issued_by.entry(caller.clone()).or_default().push(*id);
                    self.issued_for.entry(student.clone()).or_default().push(*id);
                    tracing::info!(uuid = %id, issuer = %caller, student = %student, "certificate issued");
                    Ok(())
                }
            }
        })
    }

    /// Invalidate a certificate on behalf of `caller`.
    pub fn invalidate(&self, caller: &Address, id: &CertificateId) -> Result<TxHash, RuleViolation> {
        self.submit(|| {
            let mut record = self
                .certificates
                .get_mut(id)
                .ok_or(RuleViolation::UnknownCertificate(*id))?;
            record.invalidate(caller)?;
            tracing::info!(uuid = %id, issuer = %caller, "certificate invalidated");
            Ok(())
        })
    }

    fn register(&self, caller: &Address, name: &str, role: Role) -> Result<(), RuleViolation> {
        if caller.is_zero() {
            return Err(RuleViolation::NoAccount);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(RuleViolation::EmptyName);
        }
        match self.profiles.entry(caller.clone()) {
            Entry::Occupied(_) => Err(RuleViolation::AlreadyRegistered(caller.clone())),
            Entry::Vacant(slot) => {
                slot.insert(Profile {
                    address: caller.clone(),
                    name: name.to_string(),
                    role,
                });
                tracing::info!(account = %caller, %role, "account registered");
                Ok(())
            }
        }
    }

    /// Apply a mutation as one transaction.
    ///
    /// An injected revert records a reverted transaction without running
    /// `apply`.
    fn submit<F>(&self, apply: F) -> Result<TxHash, RuleViolation>
    where
        F: FnOnce() -> Result<(), RuleViolation>,
    {
        let status = if take_one(&self.reverts) {
            TxStatus::Reverted {
                reason: "execution reverted".into(),
            }
        } else {
            apply()?;
            TxStatus::Confirmed
        };
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = TxHash::new(format!("0x{n:064x}"));
        self.transactions.insert(
            tx.clone(),
            TxEntry {
                status,
                pending_polls: self.confirmation_polls.load(Ordering::SeqCst),
            },
        );
        Ok(tx)
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_core::sha256_digest;

    fn addr(n: u8) -> Address {
        Address::new(&format!("0x{}", format!("{n:02x}").repeat(20))).unwrap()
    }

    fn cid() -> ContentReference {
        ContentReference::new("QmTest").unwrap()
    }

    fn seeded() -> (LedgerBook, Address, Address) {
        let book = LedgerBook::new();
        let (issuer, student) = (addr(1), addr(2));
        book.register_issuer(&issuer, "University").unwrap();
        book.register_user(&student, "Alice").unwrap();
        (book, issuer, student)
    }

    #[test]
    fn accounts_register_once() {
        let (book, issuer, _) = seeded();
        assert_eq!(
            book.register_user(&issuer, "again").unwrap_err(),
            RuleViolation::AlreadyRegistered(issuer.clone())
        );
        assert!(book.status(&issuer).issuer);
        assert!(!book.status(&addr(9)).registered);
    }

    #[test]
    fn empty_names_and_zero_address_are_refused() {
        let book = LedgerBook::new();
        assert_eq!(book.register_user(&addr(3), "  ").unwrap_err(), RuleViolation::EmptyName);
        assert_eq!(
            book.register_user(&Address::zero(), "x").unwrap_err(),
            RuleViolation::NoAccount
        );
    }

    #[test]
    fn only_issuers_issue_to_registered_users() {
        let (book, issuer, student) = seeded();
        let d = sha256_digest(b"doc");
        let err = book
            .issue(&student, "BSc", &student, &CertificateId::new(), &d, &cid())
            .unwrap_err();
        assert_eq!(err, RuleViolation::NotIssuer(student.clone()));
        let err = book
            .issue(&issuer, "BSc", &addr(7), &CertificateId::new(), &d, &cid())
            .unwrap_err();
        assert_eq!(err, RuleViolation::StudentNotRegistered(addr(7)));
    }

    #[test]
    fn uuid_can_be_issued_once() {
        let (book, issuer, student) = seeded();
        let id = CertificateId::new();
        let d = sha256_digest(b"doc");
        book.issue(&issuer, "BSc", &student, &id, &d, &cid()).unwrap();
        assert_eq!(
            book.issue(&issuer, "MSc", &student, &id, &d, &cid()).unwrap_err(),
            RuleViolation::DuplicateCertificate(id)
        );
        assert_eq!(book.certificate(&id).unwrap().name, "BSc");
        assert_eq!(book.issued_by(&issuer), vec![id]);
        assert_eq!(book.issued_for(&student), vec![id]);
    }

    #[test]
    fn verify_requires_every_field_and_validity() {
        let (book, issuer, student) = seeded();
        let id = CertificateId::new();
        let d = sha256_digest(b"doc");
        book.issue(&issuer, "BSc", &student, &id, &d, &cid()).unwrap();

        assert!(book.verify(&id, &issuer, &student, &d));
        assert!(!book.verify(&id, &issuer, &student, &sha256_digest(b"tampered")));
        assert!(!book.verify(&id, &student, &issuer, &d));
        assert!(!book.verify(&CertificateId::new(), &issuer, &student, &d));

        book.invalidate(&issuer, &id).unwrap();
        assert!(!book.verify(&id, &issuer, &student, &d));
    }

    #[test]
    fn invalidation_is_issuer_only_and_one_way() {
        let (book, issuer, student) = seeded();
        let id = CertificateId::new();
        book.issue(&issuer, "BSc", &student, &id, &sha256_digest(b"d"), &cid())
            .unwrap();

        assert!(matches!(
            book.invalidate(&student, &id).unwrap_err(),
            RuleViolation::Transition(TransitionError::NotIssuer { .. })
        ));
        book.invalidate(&issuer, &id).unwrap();
        assert_eq!(
            book.invalidate(&issuer, &id).unwrap_err(),
            RuleViolation::Transition(TransitionError::AlreadyInvalid(id))
        );
        assert!(!book.certificate(&id).unwrap().is_valid);
        assert_eq!(
            book.invalidate(&issuer, &CertificateId::new()).unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn transactions_confirm_after_configured_polls() {
        let book = LedgerBook::new();
        book.set_confirmation_polls(2);
        let tx = book.register_user(&addr(4), "Bob").unwrap();
        assert_eq!(book.transaction_status(&tx), Some(TxStatus::Pending));
        assert_eq!(book.transaction_status(&tx), Some(TxStatus::Pending));
        assert_eq!(book.transaction_status(&tx), Some(TxStatus::Confirmed));
        assert_eq!(book.transaction_status(&TxHash::new("0xdead")), None);
    }

    #[test]
    fn reverted_submissions_have_no_effect() {
        let book = LedgerBook::new();
        book.revert_next_submissions(1);
        let tx = book.register_user(&addr(5), "Carol").unwrap();
        assert!(matches!(
            book.transaction_status(&tx),
            Some(TxStatus::Reverted { .. })
        ));
        assert!(book.profile(&addr(5)).is_none());
    }

    #[test]
    fn injected_faults_are_consumed_in_order() {
        let book = LedgerBook::new();
        book.fail_next_calls(2);
        assert!(book.take_fault("a").unwrap_err().is_transient());
        assert!(book.take_fault("b").is_err());
        assert!(book.take_fault("c").is_ok());
    }

    #[test]
    fn lost_receipts_still_apply_the_write() {
        let book = LedgerBook::new();
        book.lose_next_receipts(1);
        let tx = book.register_user(&addr(6), "Dave").unwrap();
        let err = book.deliver_receipt("registerUser", tx.clone()).unwrap_err();
        assert!(err.is_transient());
        assert!(book.profile(&addr(6)).is_some());
        assert_eq!(book.deliver_receipt("registerUser", tx.clone()).unwrap(), tx);
    }
}
