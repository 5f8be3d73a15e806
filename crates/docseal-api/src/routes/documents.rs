//! # Document Endpoints
//!
//! | Method | Path             | Result                          |
//! |--------|------------------|---------------------------------|
//! | POST   | `/calculatehash` | `{hash}` of the upload as-is    |
//! | POST   | `/issue`         | `{uuid, hash, ipfsLink, cid}`   |
//!
//! Neither touches the ledger. `/issue` embeds, hashes and publishes; the
//! caller records the result on-chain from its own wallet. Any `/issue`
//! failure, including a bad upload, is a 500 with `{"error": message}`.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, IssueFailure};
use crate::state::AppState;
use crate::upload::Upload;

/// Response for `/calculatehash`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HashResponse {
    pub hash: String,
}

/// Response for `/issue`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub uuid: String,
    pub hash: String,
    pub ipfs_link: String,
    pub cid: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calculatehash", post(calculate_hash))
        .route("/issue", post(issue))
}

/// POST /calculatehash: SHA-256 of the uploaded PDF.
async fn calculate_hash(multipart: Multipart) -> Result<Json<HashResponse>, AppError> {
    let upload = Upload::read(multipart).await?;
    upload.require_pdf()?;
    let digest = docseal_engine::hash_document(upload.into_document().into_bytes()).await?;
    Ok(Json(HashResponse {
        hash: digest.to_hex(),
    }))
}

/// POST /issue: embed a fresh identifier, hash and publish.
async fn issue(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IssueResponse>, IssueFailure> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let upload = Upload::read(multipart).await?;
    let prepared = state.pipeline.prepare(upload.into_document()).await?;
    Ok(Json(IssueResponse {
        uuid: prepared.id.to_string(),
        hash: prepared.digest.to_hex(),
        ipfs_link: prepared.gateway_link.to_string(),
        cid: prepared.content_reference.to_string(),
    }))
}
