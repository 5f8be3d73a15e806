//! # docseal-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 5000).

use std::sync::Arc;

use docseal_api::config::AppConfig;
use docseal_api::state::AppState;
use docseal_client::{ClientConfig, DocsealClient};
use docseal_core::Ledger;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env()?;
    let client_config = ClientConfig::from_env()?;
    tracing::info!(?client_config, "collaborators configured");
    let client = DocsealClient::new(client_config)?;

    let ledger: Option<Arc<dyn Ledger>> = if config.ledger_enabled {
        if let Err(e) = client.ledger().health().await {
            tracing::warn!("ledger gateway health check failed: {e}. Ledger calls will be retried per request.");
        }
        tracing::info!(account = %client.ledger().account(), "ledger gateway enabled");
        Some(Arc::new(client.ledger().clone()))
    } else {
        tracing::warn!("LEDGER_ENABLED is off. Ledger-backed endpoints will return 503.");
        None
    };

    let state = AppState::new(
        config.clone(),
        Arc::new(client.ipfs().clone()),
        ledger,
        client.gateway().clone(),
        client.retry_policy(),
    )
    .map_err(|e| {
        tracing::error!("Staging directory setup failed: {e}");
        e
    })?;

    let app = docseal_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("DocSeal API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
