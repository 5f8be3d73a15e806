//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps engine failures to HTTP status codes and returns
//! `{"error": {"code", "message"}}` bodies. Internal and upstream details
//! are logged, never returned.
//!
//! `POST /issue` answers every failure with 500 and a flat
//! `{"error": "message"}` body instead, see [`IssueFailure`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docseal_engine::{EngineError, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed upload or unsupported document (400).
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The ledger refused the operation (409).
    #[error("ledger rejected the request: {0}")]
    Rejected(String),

    /// A field failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Publishing or another pipeline step failed (500). Message is logged only.
    #[error("internal error: {0}")]
    Internal(String),

    /// The ledger answered with something undecodable (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The ledger is not configured or stayed unreachable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Rejected(_) => (StatusCode::CONFLICT, "LEDGER_REJECTED"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    /// The message a client may see. Internal and upstream details are hidden.
    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream(_) => "An upstream service error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Construct a service unavailable error (503).
    pub fn service_unavailable(msg: &str) -> Self {
        Self::ServiceUnavailable(msg.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::error!(error = %self, "upstream error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err.kind() {
            ErrorKind::MalformedDocument | ErrorKind::UnsupportedMediaType => {
                Self::BadRequest(err.to_string())
            }
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::RpcRejected => Self::Rejected(rejection_reason(&err)),
            ErrorKind::RpcTransient => Self::ServiceUnavailable(err.to_string()),
            ErrorKind::LedgerUnavailable => Self::service_unavailable("ledger not configured"),
            ErrorKind::RpcProtocol => Self::Upstream(err.to_string()),
            ErrorKind::PublishFailure | ErrorKind::Internal => Self::Internal(err.to_string()),
        }
    }
}

fn rejection_reason(err: &EngineError) -> String {
    use docseal_core::LedgerError;
    match err {
        EngineError::Ledger(LedgerError::Rejected { reason, .. })
        | EngineError::IssuanceFailed {
            source: LedgerError::Rejected { reason, .. },
            ..
        } => reason.clone(),
        other => other.to_string(),
    }
}

impl From<docseal_core::ValidationError> for AppError {
    fn from(err: docseal_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Flat error body of `POST /issue`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlatErrorBody {
    pub error: String,
}

/// A failed `POST /issue`. Every cause answers 500 with a [`FlatErrorBody`].
#[derive(Debug)]
pub struct IssueFailure(pub AppError);

impl From<AppError> for IssueFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<EngineError> for IssueFailure {
    fn from(err: EngineError) -> Self {
        Self(AppError::from(err))
    }
}

impl IntoResponse for IssueFailure {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "issue pipeline failed");
        let body = FlatErrorBody {
            error: self.0.public_message(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
