//! Error types for document handling.

use thiserror::Error;

/// Errors from embedding and staging.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The bytes could not be parsed as a usable PDF.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The document is not a PDF.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Serialising the modified PDF failed.
    #[error("failed to write document: {0}")]
    Write(String),

    /// Staging area I/O failed.
    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }
}
