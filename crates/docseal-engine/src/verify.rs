//! # Verification Engine
//!
//! Answers "is this document the certificate the ledger says it is?" and
//! the surrounding read and lifecycle operations.
//!
//! Verification hashes the submitted bytes exactly as given (no
//! re-embedding) and asks the ledger's authoritative check. Any mismatch in
//! issuer, student, digest or validity is [`Verdict::NotAuthentic`]; only a
//! failure to reach the ledger is an error.
//!
//! Unknown identifiers and unregistered addresses produce absent results
//! (`None`, empty lists), never errors.

use std::sync::Arc;

use docseal_client::RetryPolicy;
use docseal_core::{
    AccountStatus, Address, CertificateId, CertificateRecord, ContentDigest, GatewayLink, Ledger,
    Profile, TxHash,
};
use serde::Serialize;
use url::Url;

use crate::blocking;
use crate::error::EngineError;
use crate::rpc;

/// Outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The ledger holds a valid record matching every field.
    Authentic,
    /// No valid matching record.
    NotAuthentic,
}

impl Verdict {
    /// Whether the document was authenticated.
    pub fn is_authentic(self) -> bool {
        self == Self::Authentic
    }
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid {
            Self::Authentic
        } else {
            Self::NotAuthentic
        }
    }
}

/// A certificate record as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView {
    /// The ledger record.
    #[serde(flatten)]
    pub record: CertificateRecord,
    /// The issuer's profile, if registered.
    pub issuer: Option<Profile>,
    /// The student's profile, if registered.
    pub student: Option<Profile>,
    /// Download link for the published document.
    pub ipfs_link: Url,
    /// The viewer issued this certificate.
    pub viewer_is_issuer: bool,
    /// The viewer holds this certificate.
    pub viewer_is_student: bool,
}

/// Ledger-backed verification and certificate management.
#[derive(Clone)]
pub struct VerificationEngine {
    ledger: Arc<dyn Ledger>,
    gateway: GatewayLink,
    retry: RetryPolicy,
}

impl std::fmt::Debug for VerificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationEngine")
            .field("account", &self.ledger.account())
            .field("gateway", &self.gateway.base().as_str())
            .field("retry", &self.retry)
            .finish()
    }
}

impl VerificationEngine {
    /// Create an engine with the default retry policy.
    pub fn new(ledger: Arc<dyn Ledger>, gateway: GatewayLink) -> Self {
        Self {
            ledger,
            gateway,
            retry: RetryPolicy::default(),
        }
    }

    /// Use `retry` for ledger calls.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The ledger handle.
    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    // -- Verification -------------------------------------------------------

    /// Hash `document` as submitted and check it against the ledger.
    pub async fn verify(
        &self,
        id: &CertificateId,
        issuer: &Address,
        student: &Address,
        document: Vec<u8>,
    ) -> Result<Verdict, EngineError> {
        let digest = blocking::hash_document(document).await?;
        self.verify_digest(id, issuer, student, &digest).await
    }

    /// Check an already computed digest against the ledger.
    pub async fn verify_digest(
        &self,
        id: &CertificateId,
        issuer: &Address,
        student: &Address,
        digest: &ContentDigest,
    ) -> Result<Verdict, EngineError> {
        let ledger = self.ledger.as_ref();
        let valid = rpc::read(&self.retry, "verifyCertificate", || async move {
            ledger.verify_certificate(id, issuer, student, digest).await
        })
        .await?;
        let verdict = Verdict::from(valid);
        tracing::info!(uuid = %id, digest = %digest, ?verdict, "certificate verified");
        Ok(verdict)
    }

    // -- Lookups ------------------------------------------------------------

    /// The record for `id`, if it was ever issued.
    pub async fn lookup_by_uuid(&self, id: &CertificateId) -> Result<Option<CertificateRecord>, EngineError> {
        let ledger = self.ledger.as_ref();
        Ok(rpc::read(&self.retry, "getCertificate", || async move {
            ledger.get_certificate(id).await
        })
        .await?)
    }

    /// Records issued by `issuer`, oldest first.
    pub async fn list_issued_by(&self, issuer: &Address) -> Result<Vec<CertificateRecord>, EngineError> {
        let ledger = self.ledger.as_ref();
        let ids = rpc::read(&self.retry, "getCertificatesIssuedBy", || async move {
            ledger.certificates_issued_by(issuer).await
        })
        .await?;
        self.records(&ids).await
    }

    /// Records issued to `student`, oldest first.
    pub async fn list_issued_for(&self, student: &Address) -> Result<Vec<CertificateRecord>, EngineError> {
        let ledger = self.ledger.as_ref();
        let ids = rpc::read(&self.retry, "getCertificatesIssuedFor", || async move {
            ledger.certificates_issued_for(student).await
        })
        .await?;
        self.records(&ids).await
    }

    async fn records(&self, ids: &[CertificateId]) -> Result<Vec<CertificateRecord>, EngineError> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.lookup_by_uuid(id).await? {
                Some(record) => records.push(record),
                None => tracing::warn!(uuid = %id, "listed certificate has no record"),
            }
        }
        Ok(records)
    }

    /// Profile of `address`, if registered.
    pub async fn resolve_profile(&self, address: &Address) -> Result<Option<Profile>, EngineError> {
        let ledger = self.ledger.as_ref();
        let profile = rpc::read(&self.retry, "getProfileByAddress", || async move {
            ledger.get_profile_by_address(address).await
        })
        .await?;
        Ok(profile.filter(Profile::is_registered))
    }

    /// Profile of the current account, if registered.
    pub async fn current_profile(&self) -> Result<Option<Profile>, EngineError> {
        let ledger = self.ledger.as_ref();
        let profile = rpc::read(&self.retry, "getProfile", || async move {
            ledger.get_profile().await
        })
        .await?;
        Ok(profile.filter(Profile::is_registered))
    }

    /// Registration flags of the current account.
    pub async fn account_status(&self) -> Result<AccountStatus, EngineError> {
        let ledger = self.ledger.as_ref();
        Ok(rpc::read(&self.retry, "accountStatus", || async move {
            ledger.account_status().await
        })
        .await?)
    }

    /// The record for `id` with both parties' profiles, as seen by `viewer`
    /// (the current account when `None`).
    pub async fn certificate_view(
        &self,
        id: &CertificateId,
        viewer: Option<&Address>,
    ) -> Result<Option<CertificateView>, EngineError> {
        let Some(record) = self.lookup_by_uuid(id).await? else {
            return Ok(None);
        };
        let viewer = viewer.cloned().unwrap_or_else(|| self.ledger.account());
        let issuer = self.resolve_profile(&record.issuer_address).await?;
        let student = self.resolve_profile(&record.user_address).await?;
        let ipfs_link = self.gateway.link(&record.content_reference, &record.id, "pdf");

        Ok(Some(CertificateView {
            viewer_is_issuer: !viewer.is_zero() && record.is_issued_by(&viewer),
            viewer_is_student: !viewer.is_zero() && record.is_issued_to(&viewer),
            issuer,
            student,
            ipfs_link,
            record,
        }))
    }

    // -- Writes -------------------------------------------------------------

    /// Invalidate a certificate issued by the current account.
    ///
    /// One-way. A second invalidation is rejected by the ledger. The hash is
    /// `None` when the submission's response was lost but the ledger already
    /// shows the certificate invalid.
    pub async fn invalidate(&self, id: &CertificateId) -> Result<Option<TxHash>, EngineError> {
        let ledger = self.ledger.as_ref();
        let caller = ledger.account();
        let caller = &caller;
        let tx = rpc::submit_and_confirm(
            ledger,
            &self.retry,
            "invalidateCertificate",
            || async move { ledger.submit_invalidate_certificate(id).await },
            || async move {
                Ok(ledger
                    .get_certificate(id)
                    .await?
                    .is_some_and(|r| r.is_issued_by(caller) && !r.is_valid))
            },
        )
        .await?;
        tracing::info!(uuid = %id, tx = ?tx, "certificate invalidated");
        Ok(tx)
    }

    /// Register the current account as a student.
    pub async fn register_user(&self, name: &str) -> Result<Option<TxHash>, EngineError> {
        let ledger = self.ledger.as_ref();
        Ok(rpc::submit_and_confirm(
            ledger,
            &self.retry,
            "registerUser",
            || async move { ledger.submit_register_user(name).await },
            || async move { ledger.is_user().await },
        )
        .await?)
    }

    /// Register the current account as an issuer.
    pub async fn register_issuer(&self, name: &str) -> Result<Option<TxHash>, EngineError> {
        let ledger = self.ledger.as_ref();
        Ok(rpc::submit_and_confirm(
            ledger,
            &self.retry,
            "registerIssuer",
            || async move { ledger.submit_register_issuer(name).await },
            || async move { ledger.is_issuer().await },
        )
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use docseal_core::{sha256_digest, ContentReference, Role, DEFAULT_GATEWAY};
    use docseal_ledger_stub::MemoryLedger;

    use crate::error::ErrorKind;

    fn addr(n: u8) -> Address {
        Address::new(&format!("0x{}", format!("{n:02x}").repeat(20))).unwrap()
    }

    fn engine(ledger: &MemoryLedger) -> VerificationEngine {
        VerificationEngine::new(Arc::new(ledger.clone()), GatewayLink::new(DEFAULT_GATEWAY).unwrap())
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
    }

    /// An issuer handle with one certificate issued to `addr(2)`.
    fn seeded(document: &[u8]) -> (MemoryLedger, CertificateId) {
        let issuer = MemoryLedger::new(addr(1));
        let book = issuer.book();
        book.register_issuer(&addr(1), "University").unwrap();
        book.register_user(&addr(2), "Alice").unwrap();
        let id = CertificateId::new();
        book.issue(
            &addr(1),
            "BSc",
            &addr(2),
            &id,
            &sha256_digest(document),
            &ContentReference::new("QmSeeded").unwrap(),
        )
        .unwrap();
        (issuer, id)
    }

    #[tokio::test]
    async fn matching_document_is_authentic() {
        let (ledger, id) = seeded(b"sealed bytes");
        let engine = engine(&ledger);
        let verdict = engine
            .verify(&id, &addr(1), &addr(2), b"sealed bytes".to_vec())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Authentic);
    }

    #[tokio::test]
    async fn any_mismatch_is_not_authentic() {
        let (ledger, id) = seeded(b"sealed bytes");
        let engine = engine(&ledger);
        let cases = [
            (id, addr(1), addr(2), b"sealed byteS".to_vec()),
            (id, addr(2), addr(2), b"sealed bytes".to_vec()),
            (id, addr(1), addr(3), b"sealed bytes".to_vec()),
            (CertificateId::new(), addr(1), addr(2), b"sealed bytes".to_vec()),
        ];
        for (id, issuer, student, doc) in cases {
            let verdict = engine.verify(&id, &issuer, &student, doc).await.unwrap();
            assert_eq!(verdict, Verdict::NotAuthentic);
        }
    }

    #[tokio::test]
    async fn invalidation_is_one_way() {
        let (ledger, id) = seeded(b"doc");
        let engine = engine(&ledger);

        engine.invalidate(&id).await.unwrap();
        let record = engine.lookup_by_uuid(&id).await.unwrap().unwrap();
        assert!(!record.is_valid);

        let err = engine.invalidate(&id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RpcRejected);
        assert!(!engine.lookup_by_uuid(&id).await.unwrap().unwrap().is_valid);

        let verdict = engine
            .verify_digest(&id, &addr(1), &addr(2), &sha256_digest(b"doc"))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::NotAuthentic);
    }

    #[tokio::test]
    async fn lost_invalidation_receipt_is_not_reported_as_rejection() {
        let (ledger, id) = seeded(b"doc");
        let engine = engine(&ledger);
        ledger.book().lose_next_receipts(1);

        let tx = engine.invalidate(&id).await.unwrap();
        assert!(tx.is_none());
        assert!(!engine.lookup_by_uuid(&id).await.unwrap().unwrap().is_valid);
    }

    #[tokio::test]
    async fn only_the_issuer_can_invalidate() {
        let (ledger, id) = seeded(b"doc");
        let student = engine(&ledger.connect(addr(2)));
        let err = student.invalidate(&id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RpcRejected);
        assert!(student.lookup_by_uuid(&id).await.unwrap().unwrap().is_valid);
    }

    #[tokio::test]
    async fn absent_things_are_not_errors() {
        let ledger = MemoryLedger::new(addr(1));
        let engine = engine(&ledger);
        assert!(engine.lookup_by_uuid(&CertificateId::new()).await.unwrap().is_none());
        assert!(engine.list_issued_by(&addr(9)).await.unwrap().is_empty());
        assert!(engine.list_issued_for(&addr(9)).await.unwrap().is_empty());
        assert!(engine.resolve_profile(&addr(9)).await.unwrap().is_none());
        assert!(engine.current_profile().await.unwrap().is_none());
        assert!(engine
            .certificate_view(&CertificateId::new(), None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn listings_resolve_records() {
        let (ledger, id) = seeded(b"doc");
        let engine = engine(&ledger);
        let by = engine.list_issued_by(&addr(1)).await.unwrap();
        let for_student = engine.list_issued_for(&addr(2)).await.unwrap();
        assert_eq!(by.len(), 1);
        assert_eq!(by, for_student);
        assert_eq!(by[0].id, id);
    }

    #[tokio::test]
    async fn view_flags_follow_the_viewer() {
        let (ledger, id) = seeded(b"doc");
        let engine = engine(&ledger);

        let as_issuer = engine.certificate_view(&id, None).await.unwrap().unwrap();
        assert!(as_issuer.viewer_is_issuer);
        assert!(!as_issuer.viewer_is_student);
        assert_eq!(as_issuer.issuer.as_ref().unwrap().role, Role::Issuer);
        assert_eq!(as_issuer.student.as_ref().unwrap().name, "Alice");
        assert!(as_issuer.ipfs_link.as_str().contains("QmSeeded"));

        let as_student = engine.certificate_view(&id, Some(&addr(2))).await.unwrap().unwrap();
        assert!(!as_student.viewer_is_issuer);
        assert!(as_student.viewer_is_student);

        let anonymous = engine
            .certificate_view(&id, Some(&Address::zero()))
            .await
            .unwrap()
            .unwrap();
        assert!(!anonymous.viewer_is_issuer && !anonymous.viewer_is_student);
    }

    #[tokio::test]
    async fn view_serialises_flat() {
        let (ledger, id) = seeded(b"doc");
        let view = engine(&ledger).certificate_view(&id, None).await.unwrap().unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["uuid"], id.to_string());
        assert_eq!(json["isValid"], true);
        assert_eq!(json["viewerIsIssuer"], true);
        assert_eq!(json["issuer"]["name"], "University");
        let link = json["ipfsLink"].as_str().unwrap();
        assert_eq!(link, view.ipfs_link.as_str());
        assert!(link.starts_with("https://ipfs.io/ipfs/QmSeeded"));
    }

    #[tokio::test]
    async fn registration_and_status() {
        let ledger = MemoryLedger::new(addr(5));
        let engine = engine(&ledger);
        assert!(!engine.account_status().await.unwrap().registered);

        engine.register_issuer("Institute").await.unwrap();
        let status = engine.account_status().await.unwrap();
        assert!(status.registered && status.issuer && !status.user);
        assert_eq!(engine.current_profile().await.unwrap().unwrap().name, "Institute");

        let err = engine.register_user("again").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RpcRejected);
    }

    #[tokio::test]
    async fn unreachable_ledger_is_transient() {
        let (ledger, id) = seeded(b"doc");
        ledger.book().fail_next_calls(3);
        let err = engine(&ledger)
            .verify_digest(&id, &addr(1), &addr(2), &sha256_digest(b"doc"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RpcTransient);
    }
}
