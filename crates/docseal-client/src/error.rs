//! Client error types and their mapping onto the collaborator error kinds.

use docseal_core::{BlobError, LedgerError};

/// Errors from HTTP calls to the ledger gateway or IPFS.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response decoded but carried an unusable value.
    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ClientError {
    /// Whether the failure may clear up on retry: transport errors,
    /// server errors, rate limiting and request timeouts.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::ApiError { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            _ => false,
        }
    }

    /// Classify as a ledger failure.
    pub fn into_ledger_error(self, operation: &str) -> LedgerError {
        if self.is_transient() {
            return LedgerError::transient(operation, self.to_string());
        }
        match self {
            Self::ApiError { body, status, .. } => {
                let reason = if body.trim().is_empty() {
                    format!("status {status}")
                } else {
                    rejection_reason(&body)
                };
                LedgerError::rejected(operation, reason)
            }
            other => LedgerError::protocol(operation, other.to_string()),
        }
    }
}

impl From<ClientError> for BlobError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http { endpoint, source } => BlobError::Transport {
                endpoint,
                message: source.to_string(),
            },
            ClientError::ApiError {
                endpoint,
                status,
                body,
            } => BlobError::Api {
                endpoint,
                status,
                body,
            },
            ClientError::Deserialization { endpoint, source } => BlobError::Deserialization {
                endpoint,
                message: source.to_string(),
            },
            ClientError::InvalidResponse { endpoint, message } => {
                BlobError::Deserialization { endpoint, message }
            }
            ClientError::Config(e) => BlobError::Transport {
                endpoint: "client_init".into(),
                message: e.to_string(),
            },
        }
    }
}

/// Pull `error.message` or `error` out of a JSON error body, falling back
/// to the raw body.
fn rejection_reason(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
