//! # Ledger-Backed Endpoints
//!
//! | Method | Path                                   | Result                     |
//! |--------|----------------------------------------|----------------------------|
//! | POST   | `/verify`                              | `{authentic, hash}`        |
//! | POST   | `/certificates`                        | issued record + `ipfsLink` |
//! | GET    | `/certificates/:uuid`                  | certificate view / 404     |
//! | POST   | `/certificates/:uuid/invalidate`       | `{uuid, txHash}`           |
//! | GET    | `/profiles/:address`                   | profile / 404              |
//! | GET    | `/accounts/:address/certificates`      | records                    |
//!
//! All of them return 503 when no ledger is configured.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use docseal_core::{Address, CertificateId, CertificateRecord, Profile, TxHash};
use docseal_engine::{CertificateView, VerificationEngine};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use crate::upload::Upload;

/// Response for `/verify`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub authentic: bool,
    pub hash: String,
}

/// Response for `POST /certificates`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedResponse {
    #[serde(flatten)]
    pub record: CertificateRecord,
    pub ipfs_link: String,
}

/// Response for invalidation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateResponse {
    pub uuid: CertificateId,
    /// `null` when the ledger applied the write but its receipt was lost.
    pub tx_hash: Option<TxHash>,
}

/// Which side of an account's certificates to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    IssuedBy,
    #[default]
    IssuedFor,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    direction: Direction,
}

/// `viewer` stays a string so a bad address is a 422, not a query rejection.
#[derive(Debug, Deserialize)]
struct ViewQuery {
    viewer: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", post(verify))
        .route("/certificates", post(issue_certificate))
        .route("/certificates/:uuid", get(get_certificate))
        .route("/certificates/:uuid/invalidate", post(invalidate_certificate))
        .route("/profiles/:address", get(get_profile))
        .route("/accounts/:address/certificates", get(list_certificates))
}

fn require_engine(state: &AppState) -> Result<&VerificationEngine, AppError> {
    state
        .engine
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("ledger not configured"))
}

fn parse_id(raw: &str) -> Result<CertificateId, AppError> {
    raw.parse().map_err(AppError::from)
}

/// POST /verify: hash the upload as submitted and check it on the ledger.
async fn verify(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<VerifyResponse>, AppError> {
    let engine = require_engine(&state)?;
    let upload = Upload::read(multipart).await?;
    upload.require_pdf()?;
    let id = parse_id(upload.field("uuid")?)?;
    let issuer = Address::new(upload.field("issuer")?)?;
    let student = Address::new(upload.field("student")?)?;

    let digest = docseal_engine::hash_document(upload.into_document().into_bytes()).await?;
    let verdict = engine.verify_digest(&id, &issuer, &student, &digest).await?;
    Ok(Json(VerifyResponse {
        authentic: verdict.is_authentic(),
        hash: digest.to_hex(),
    }))
}

/// POST /certificates: run the whole pipeline and record on the ledger.
async fn issue_certificate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<IssuedResponse>), AppError> {
    require_engine(&state)?;
    let upload = Upload::read(multipart).await?;
    let name = upload.field("name")?.to_string();
    let student = Address::new(upload.field("student")?)?;

    let record = state
        .pipeline
        .issue(&name, &student, upload.into_document())
        .await?;
    let ipfs_link = state
        .pipeline
        .gateway()
        .link(&record.content_reference, &record.id, "pdf")
        .to_string();
    Ok((StatusCode::CREATED, Json(IssuedResponse { record, ipfs_link })))
}

/// GET /certificates/:uuid: the record with both parties' profiles.
async fn get_certificate(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<CertificateView>, AppError> {
    let engine = require_engine(&state)?;
    let id = parse_id(&uuid)?;
    let viewer = query.viewer.as_deref().map(Address::new).transpose()?;
    engine
        .certificate_view(&id, viewer.as_ref())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("certificate {id}")))
}

/// POST /certificates/:uuid/invalidate: one-way, issuer only.
async fn invalidate_certificate(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<InvalidateResponse>, AppError> {
    let engine = require_engine(&state)?;
    let id = parse_id(&uuid)?;
    let tx_hash = engine.invalidate(&id).await?;
    Ok(Json(InvalidateResponse { uuid: id, tx_hash }))
}

/// GET /profiles/:address
async fn get_profile(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let engine = require_engine(&state)?;
    let address = Address::new(&address)?;
    engine
        .resolve_profile(&address)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("profile {address}")))
}

/// GET /accounts/:address/certificates?direction=issued-by|issued-for
async fn list_certificates(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CertificateRecord>>, AppError> {
    let engine = require_engine(&state)?;
    let address = Address::new(&address)?;
    let records = match query.direction {
        Direction::IssuedBy => engine.list_issued_by(&address).await?,
        Direction::IssuedFor => engine.list_issued_for(&address).await?,
    };
    Ok(Json(records))
}
