//! # docseal-api: HTTP Service for DocSeal
//!
//! ## API Surface
//!
//! | Prefix                 | Module                     | Needs ledger |
//! |------------------------|----------------------------|--------------|
//! | `/`, `/healthcheck`    | this module                | no           |
//! | `/calculatehash`       | [`routes::documents`]      | no           |
//! | `/issue`               | [`routes::documents`]      | no           |
//! | `/verify`              | [`routes::certificates`]   | yes          |
//! | `/certificates/*`      | [`routes::certificates`]   | yes          |
//! | `/profiles/*`          | [`routes::certificates`]   | yes          |
//! | `/accounts/*`          | [`routes::certificates`]   | yes          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CorsLayer (permissive) → DefaultBodyLimit (10 MiB) → Handler
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/healthcheck", get(status))
        .merge(routes::documents::router())
        .merge(routes::certificates::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness: 200 whenever the process is serving.
async fn status() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
