//! Route definitions for the ledger gateway stub.
//!
//! Serves the protocol that `docseal-client`'s `HttpLedger` speaks (see
//! `docseal_client::wire`), with rule violations reported as
//! `{"error": {"code", "message"}}` and injected faults as 503.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use docseal_client::wire::{
    IssueRequest, RegisterRequest, TxReceipt, VerifyRequest, VerifyResponse, ACCOUNT_HEADER,
};
use docseal_core::{Address, CertificateId, TxHash, TransitionError};
use serde_json::json;

use crate::book::{LedgerBook, RuleViolation};

/// Build the complete router with all ledger gateway routes.
pub fn router(book: Arc<LedgerBook>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/account/status", get(account_status))
        .route("/v1/account/profile", get(account_profile))
        .route("/v1/profiles/:address", get(profile_by_address))
        .route("/v1/users", post(register_user))
        .route("/v1/issuers", post(register_issuer))
        .route("/v1/certificates", post(issue_certificate))
        .route("/v1/certificates/:uuid", get(get_certificate))
        .route("/v1/certificates/:uuid/invalidate", post(invalidate_certificate))
        .route("/v1/certificates/:uuid/verify", post(verify_certificate))
        .route(
            "/v1/accounts/:address/certificates/issued-by",
            get(issued_by),
        )
        .route(
            "/v1/accounts/:address/certificates/issued-for",
            get(issued_for),
        )
        .route("/v1/transactions/:tx", get(transaction_status))
        .fallback(not_implemented)
        .with_state(book)
}

// ── Helpers ─────────────────────────────────────────────────────────

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = json!({"error": {"code": code, "message": message.into()}});
    (status, Json(body)).into_response()
}

fn violation_response(v: RuleViolation) -> Response {
    let status = match &v {
        RuleViolation::EmptyName => StatusCode::UNPROCESSABLE_ENTITY,
        RuleViolation::NoAccount => StatusCode::UNAUTHORIZED,
        RuleViolation::NotIssuer(_) | RuleViolation::Transition(TransitionError::NotIssuer { .. }) => {
            StatusCode::FORBIDDEN
        }
        RuleViolation::UnknownCertificate(_) => StatusCode::NOT_FOUND,
        RuleViolation::StudentNotRegistered(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RuleViolation::AlreadyRegistered(_)
        | RuleViolation::DuplicateCertificate(_)
        | RuleViolation::Transition(TransitionError::AlreadyInvalid(_)) => StatusCode::CONFLICT,
    };
    error_response(status, v.code(), v.to_string())
}

/// The acting account. A missing header acts as the zero address.
fn caller(headers: &HeaderMap) -> Result<Address, Response> {
    match headers.get(ACCOUNT_HEADER) {
        None => Ok(Address::zero()),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|s| Address::new(s).ok())
            .ok_or_else(|| {
                error_response(
                    StatusCode::BAD_REQUEST,
                    "BAD_REQUEST",
                    format!("invalid {ACCOUNT_HEADER} header"),
                )
            }),
    }
}

fn fault(book: &LedgerBook, operation: &str) -> Result<(), Response> {
    book.take_fault(operation).map_err(|e| {
        error_response(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", e.to_string())
    })
}

fn receipt(result: Result<TxHash, RuleViolation>) -> Response {
    match result {
        Ok(tx_hash) => (StatusCode::ACCEPTED, Json(TxReceipt { tx_hash })).into_response(),
        Err(v) => violation_response(v),
    }
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> StatusCode {
    StatusCode::OK
}

// ── Accounts and profiles ───────────────────────────────────────────

async fn account_status(State(book): State<Arc<LedgerBook>>, headers: HeaderMap) -> Response {
    let caller = match caller(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = fault(&book, "accountStatus") {
        return resp;
    }
    Json(book.status(&caller)).into_response()
}

async fn account_profile(State(book): State<Arc<LedgerBook>>, headers: HeaderMap) -> Response {
    let caller = match caller(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = fault(&book, "getProfile") {
        return resp;
    }
    match book.profile(&caller) {
        Some(p) => Json(p).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn profile_by_address(
    State(book): State<Arc<LedgerBook>>,
    Path(address): Path<Address>,
) -> Response {
    if let Err(resp) = fault(&book, "getProfileByAddress") {
        return resp;
    }
    match book.profile(&address) {
        Some(p) => Json(p).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn register_user(
    State(book): State<Arc<LedgerBook>>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let caller = match caller(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = fault(&book, "registerUser") {
        return resp;
    }
    receipt(book.register_user(&caller, &body.name))
}

async fn register_issuer(
    State(book): State<Arc<LedgerBook>>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let caller = match caller(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = fault(&book, "registerIssuer") {
        return resp;
    }
    receipt(book.register_issuer(&caller, &body.name))
}

// ── Certificates ────────────────────────────────────────────────────

async fn issue_certificate(
    State(book): State<Arc<LedgerBook>>,
    headers: HeaderMap,
    Json(body): Json<IssueRequest>,
) -> Response {
    let caller = match caller(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = fault(&book, "issueCertificate") {
        return resp;
    }
    receipt(book.issue(
        &caller,
        &body.name,
        &body.student_address,
        &body.uuid,
        &body.digest,
        &body.content_reference,
    ))
}

async fn invalidate_certificate(
    State(book): State<Arc<LedgerBook>>,
    headers: HeaderMap,
    Path(id): Path<CertificateId>,
) -> Response {
    let caller = match caller(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = fault(&book, "invalidateCertificate") {
        return resp;
    }
    receipt(book.invalidate(&caller, &id))
}

async fn get_certificate(
    State(book): State<Arc<LedgerBook>>,
    Path(id): Path<CertificateId>,
) -> Response {
    if let Err(resp) = fault(&book, "getCertificate") {
        return resp;
    }
    match book.certificate(&id) {
        Some(record) => Json(record).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn verify_certificate(
    State(book): State<Arc<LedgerBook>>,
    Path(id): Path<CertificateId>,
    Json(body): Json<VerifyRequest>,
) -> Response {
    if let Err(resp) = fault(&book, "verifyCertificate") {
        return resp;
    }
    let valid = book.verify(&id, &body.issuer_address, &body.student_address, &body.digest);
    Json(VerifyResponse { valid }).into_response()
}

async fn issued_by(
    State(book): State<Arc<LedgerBook>>,
    Path(address): Path<Address>,
) -> Response {
    if let Err(resp) = fault(&book, "getCertificatesIssuedBy") {
        return resp;
    }
    Json(book.issued_by(&address)).into_response()
}

async fn issued_for(
    State(book): State<Arc<LedgerBook>>,
    Path(address): Path<Address>,
) -> Response {
    if let Err(resp) = fault(&book, "getCertificatesIssuedFor") {
        return resp;
    }
    Json(book.issued_for(&address)).into_response()
}

// ── Transactions ────────────────────────────────────────────────────

async fn transaction_status(
    State(book): State<Arc<LedgerBook>>,
    Path(tx): Path<TxHash>,
) -> Response {
    if let Err(resp) = fault(&book, "transactionStatus") {
        return resp;
    }
    match book.transaction_status(&tx) {
        Some(status) => Json(status).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("unknown transaction {tx}"),
        ),
    }
}

// ── Fallback ────────────────────────────────────────────────────────

async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}
