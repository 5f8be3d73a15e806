//! # docseal-client -- HTTP clients for DocSeal's collaborators
//!
//! - **Ledger** via a JSON gateway in front of the certificate contract
//!   ([`HttpLedger`], protocol in [`wire`])
//! - **Content-addressed storage** via the IPFS HTTP API ([`IpfsBlobStore`])
//! - **Resilient calls** via exponential backoff ([`retry`])
//!
//! ## Architecture
//!
//! Both clients implement the collaborator traits from `docseal-core`
//! ([`docseal_core::Ledger`], [`docseal_core::BlobStore`]). The pipeline and
//! engine only ever see the traits, so the in-memory ledger stub and blob
//! store can be swapped in for tests.

pub mod config;
pub mod error;
pub mod ipfs;
pub mod ledger;
pub mod retry;
pub mod wire;

pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use ipfs::IpfsBlobStore;
pub use ledger::HttpLedger;
pub use retry::{with_retry, with_retry_if, RetryPolicy};

use docseal_core::GatewayLink;

/// Top-level DocSeal client. Holds the ledger and IPFS sub-clients.
#[derive(Debug, Clone)]
pub struct DocsealClient {
    ledger: HttpLedger,
    ipfs: IpfsBlobStore,
    gateway: GatewayLink,
    retry: RetryPolicy,
}

impl DocsealClient {
    /// Create a new client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.ledger_api_token {
            let mut value =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                    .map_err(|_| {
                        ClientError::Config(ConfigError::Invalid(
                            "LEDGER_API_TOKEN".into(),
                            "not a valid header value".into(),
                        ))
                    })?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let ledger_http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        // The IPFS node must never see the ledger token.
        let ipfs_http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            ledger: HttpLedger::new(ledger_http, config.ledger_url, config.ledger_account),
            ipfs: IpfsBlobStore::new(ipfs_http, config.ipfs_api_url, config.retry),
            gateway: config.gateway,
            retry: config.retry,
        })
    }

    /// Access the ledger gateway client.
    pub fn ledger(&self) -> &HttpLedger {
        &self.ledger
    }

    /// Access the IPFS client.
    pub fn ipfs(&self) -> &IpfsBlobStore {
        &self.ipfs
    }

    /// Public gateway for download links.
    pub fn gateway(&self) -> &GatewayLink {
        &self.gateway
    }

    /// Backoff schedule for ledger calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}
