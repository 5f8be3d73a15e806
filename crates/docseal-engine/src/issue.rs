//! # Certification Pipeline
//!
//! Turns an uploaded document into an anchored certificate:
//!
//! 1. **Mint** a fresh [`CertificateId`].
//! 2. **Embed** `UUID: <id>` onto every page.
//! 3. **Stage and hash** the embedded artifact. The digest is taken from
//!    the staged file, which is removed when the step ends.
//! 4. **Publish** the artifact to the content-addressed network.
//! 5. **Record** `(name, student, id, digest, reference)` on the ledger and
//!    wait for confirmation.
//! 6. **Read back** the confirmed record.
//!
//! Steps 1-4 are [`CertificationPipeline::prepare`]. Publishing always
//! completes before the ledger write starts. If the write fails, the
//! published artifact stays published and the failure is reported as
//! [`EngineError::IssuanceFailed`] carrying its reference.

use std::sync::Arc;

use docseal_client::RetryPolicy;
use docseal_core::{
    Address, BlobStore, CertificateId, CertificateRecord, ContentDigest, ContentReference,
    GatewayLink, Ledger,
};
use docseal_document::{embed, Document, DocumentError, DocumentStore};
use url::Url;

use crate::blocking;
use crate::error::EngineError;
use crate::rpc;

/// An embedded, hashed and published document, not yet on the ledger.
#[derive(Debug, Clone)]
pub struct PreparedCertificate {
    /// The identifier rendered into the document.
    pub id: CertificateId,
    /// SHA-256 of the embedded document.
    pub digest: ContentDigest,
    /// Where the embedded document was published.
    pub content_reference: ContentReference,
    /// Public download link for the embedded document.
    pub gateway_link: Url,
    /// The embedded document itself.
    pub document: Document,
}

/// Issues certificates against a ledger and a blob store.
#[derive(Clone)]
pub struct CertificationPipeline {
    ledger: Option<Arc<dyn Ledger>>,
    blobs: Arc<dyn BlobStore>,
    staging: DocumentStore,
    gateway: GatewayLink,
    retry: RetryPolicy,
}

impl std::fmt::Debug for CertificationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificationPipeline")
            .field("account", &self.ledger.as_ref().map(|l| l.account()))
            .field("staging", &self.staging.dir())
            .field("gateway", &self.gateway.base().as_str())
            .field("retry", &self.retry)
            .finish()
    }
}

impl CertificationPipeline {
    /// Create a pipeline with the default retry policy.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        blobs: Arc<dyn BlobStore>,
        staging: DocumentStore,
        gateway: GatewayLink,
    ) -> Self {
        Self {
            ledger: Some(ledger),
            blobs,
            staging,
            gateway,
            retry: RetryPolicy::default(),
        }
    }

    /// A pipeline that can [`prepare`](Self::prepare) but not record.
    pub fn publish_only(blobs: Arc<dyn BlobStore>, staging: DocumentStore, gateway: GatewayLink) -> Self {
        Self {
            ledger: None,
            blobs,
            staging,
            gateway,
            retry: RetryPolicy::default(),
        }
    }

    /// Use `retry` for ledger calls.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The ledger this pipeline records on, if any.
    pub fn ledger(&self) -> Option<&Arc<dyn Ledger>> {
        self.ledger.as_ref()
    }

    /// The gateway used for download links.
    pub fn gateway(&self) -> &GatewayLink {
        &self.gateway
    }

    /// Mint, embed, hash and publish. Nothing is written to the ledger.
    pub async fn prepare(&self, document: Document) -> Result<PreparedCertificate, EngineError> {
        let id = CertificateId::new();
        let staging = self.staging.clone();

        let (embedded, digest) = blocking::run(move || -> Result<_, DocumentError> {
            let embedded = embed(&document, &id)?;
            let staged = staging.stage(&embedded)?;
            let digest = staged.digest()?;
            Ok((embedded, digest))
        })
        .await?;
        tracing::debug!(uuid = %id, digest = %digest, "document embedded and hashed");

        let content_reference = self.blobs.publish(embedded.bytes()).await?;
        let gateway_link =
            self.gateway
                .link(&content_reference, &id, embedded.media_type().extension());
        tracing::info!(uuid = %id, digest = %digest, cid = %content_reference, "certificate prepared");

        Ok(PreparedCertificate {
            id,
            digest,
            content_reference,
            gateway_link,
            document: embedded,
        })
    }

    /// Record a prepared certificate on the ledger and return the confirmed record.
    pub async fn record(
        &self,
        name: &str,
        student: &Address,
        prepared: &PreparedCertificate,
    ) -> Result<CertificateRecord, EngineError> {
        let ledger = self.ledger.as_deref().ok_or(EngineError::LedgerUnavailable)?;
        let id = &prepared.id;
        let digest = &prepared.digest;
        let content_reference = &prepared.content_reference;

        let issuer = ledger.account();
        let issuer = &issuer;
        rpc::submit_and_confirm(
            ledger,
            &self.retry,
            "issueCertificate",
            || async move {
                ledger
                    .submit_issue_certificate(name, student, id, digest, content_reference)
                    .await
            },
            || async move {
                Ok(ledger.get_certificate(id).await?.is_some_and(|r| {
                    r.is_issued_by(issuer)
                        && r.is_issued_to(student)
                        && r.digest == *digest
                        && r.content_reference == *content_reference
                }))
            },
        )
        .await
        .map_err(|source| {
            tracing::error!(uuid = %id, cid = %content_reference, error = %source, "ledger write failed, published content is orphaned");
            EngineError::IssuanceFailed {
                id: *id,
                content_reference: content_reference.clone(),
                source,
            }
        })?;

        let record = rpc::read(&self.retry, "getCertificate", || async move {
            ledger.get_certificate(id).await
        })
        .await?
        .ok_or(EngineError::MissingRecord(*id))?;

        tracing::info!(uuid = %id, student = %student, "certificate issued");
        Ok(record)
    }

    /// Run the whole pipeline for `document`.
    pub async fn issue(
        &self,
        name: &str,
        student: &Address,
        document: Document,
    ) -> Result<CertificateRecord, EngineError> {
        let prepared = self.prepare(document).await?;
        self.record(name, student, &prepared).await
    }
}
