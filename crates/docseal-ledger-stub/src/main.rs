//! Ledger gateway stub server for local development.
//!
//! In-memory implementation of the gateway endpoints that
//! `docseal-client` calls. Storage is a DashMap-backed book with no
//! persistence; data is lost on restart.

use std::net::SocketAddr;
use std::sync::Arc;

use docseal_ledger_stub::{router, LedgerBook};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("LEDGER_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8545);

    let app = router(Arc::new(LedgerBook::new()));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("docseal-ledger-stub listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await
}
