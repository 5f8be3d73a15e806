//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! The pipeline is always present: embedding, hashing and publishing need
//! no ledger. The verification engine exists only when a ledger is
//! configured; ledger-backed routes return 503 otherwise.

use std::sync::Arc;

use docseal_client::RetryPolicy;
use docseal_core::{BlobStore, GatewayLink, Ledger};
use docseal_document::{DocumentError, DocumentStore};
use docseal_engine::{CertificationPipeline, VerificationEngine};

use crate::config::AppConfig;

/// Shared application state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: CertificationPipeline,
    pub engine: Option<VerificationEngine>,
}

impl AppState {
    /// Assemble state from collaborators. Creates the staging directory.
    pub fn new(
        config: AppConfig,
        blobs: Arc<dyn BlobStore>,
        ledger: Option<Arc<dyn Ledger>>,
        gateway: GatewayLink,
        retry: RetryPolicy,
    ) -> Result<Self, DocumentError> {
        let staging = DocumentStore::new(&config.staging_dir)?;
        let (pipeline, engine) = match ledger {
            Some(ledger) => (
                CertificationPipeline::new(Arc::clone(&ledger), blobs, staging, gateway.clone()),
                Some(VerificationEngine::new(ledger, gateway).with_retry_policy(retry)),
            ),
            None => (CertificationPipeline::publish_only(blobs, staging, gateway), None),
        };
        Ok(Self {
            config,
            pipeline: pipeline.with_retry_policy(retry),
            engine,
        })
    }
}
