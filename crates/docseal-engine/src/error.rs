//! Error types for the pipeline and the verification engine.
//!
//! Every failure carries an [`ErrorKind`] so outer surfaces (HTTP, CLI) can
//! react to the class of failure without matching on every source variant.

use docseal_core::{BlobError, CertificateId, ContentReference, LedgerError};
use docseal_document::DocumentError;
use thiserror::Error;

/// Class of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document could not be parsed or has no pages. Never retried.
    MalformedDocument,
    /// The document is not a PDF.
    UnsupportedMediaType,
    /// The content-addressed network refused or failed the upload.
    PublishFailure,
    /// The ledger stayed unreachable or unconfirmed for the whole retry budget.
    RpcTransient,
    /// The ledger refused the call.
    RpcRejected,
    /// The ledger answered with something undecodable.
    RpcProtocol,
    /// Referenced content or record does not exist.
    NotFound,
    /// No ledger is configured.
    LedgerUnavailable,
    /// Local failure: staging I/O, serialisation, a panicked worker.
    Internal,
}

/// Errors from issuance and verification.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Embedding or staging failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Publishing the embedded artifact failed.
    #[error("publish failed: {0}")]
    Publish(#[from] BlobError),

    /// A ledger call failed after retries.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The artifact was published but the ledger write did not go through.
    /// The published content is not rolled back.
    #[error("issuance of certificate {id} failed after publishing {content_reference}: {source}")]
    IssuanceFailed {
        /// The minted identifier.
        id: CertificateId,
        /// Where the orphaned artifact was published.
        content_reference: ContentReference,
        /// The ledger failure.
        #[source]
        source: LedgerError,
    },

    /// The operation needs a ledger and none is configured.
    #[error("no ledger configured")]
    LedgerUnavailable,

    /// A confirmed write whose record cannot be read back.
    #[error("certificate {0} was confirmed but is missing from the ledger")]
    MissingRecord(CertificateId),

    /// A blocking worker panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl EngineError {
    /// The class of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Document(DocumentError::Malformed(_)) => ErrorKind::MalformedDocument,
            Self::Document(DocumentError::UnsupportedMediaType(_)) => ErrorKind::UnsupportedMediaType,
            Self::Document(_) => ErrorKind::Internal,
            Self::Publish(BlobError::NotFound(_)) => ErrorKind::NotFound,
            Self::Publish(_) => ErrorKind::PublishFailure,
            Self::Ledger(e) | Self::IssuanceFailed { source: e, .. } => ledger_kind(e),
            Self::LedgerUnavailable => ErrorKind::LedgerUnavailable,
            Self::MissingRecord(_) => ErrorKind::RpcProtocol,
            Self::Task(_) => ErrorKind::Internal,
        }
    }
}

fn ledger_kind(err: &LedgerError) -> ErrorKind {
    match err {
        LedgerError::Transient { .. } => ErrorKind::RpcTransient,
        LedgerError::Rejected { .. } => ErrorKind::RpcRejected,
        LedgerError::Protocol { .. } => ErrorKind::RpcProtocol,
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_source() {
        assert_eq!(
            EngineError::from(DocumentError::Malformed("x".into())).kind(),
            ErrorKind::MalformedDocument
        );
        assert_eq!(
            EngineError::from(DocumentError::UnsupportedMediaType("png".into())).kind(),
            ErrorKind::UnsupportedMediaType
        );
        assert_eq!(
            EngineError::from(BlobError::Transport {
                endpoint: "add".into(),
                message: "refused".into(),
            })
            .kind(),
            ErrorKind::PublishFailure
        );
        assert_eq!(
            EngineError::from(LedgerError::rejected("issueCertificate", "not issuer")).kind(),
            ErrorKind::RpcRejected
        );
    }

    #[test]
    fn issuance_failure_reports_ledger_kind() {
        let err = EngineError::IssuanceFailed {
            id: CertificateId::new(),
            content_reference: ContentReference::new("QmOrphan").unwrap(),
            source: LedgerError::transient("issueCertificate", "timeout"),
        };
        assert_eq!(err.kind(), ErrorKind::RpcTransient);
        assert!(err.to_string().contains("QmOrphan"));
    }
}
