//! DocSeal client configuration.
//!
//! Points at the ledger gateway and an IPFS node. Defaults target a local
//! development setup (ledger stub on 8545, IPFS daemon on 5001). Override
//! via environment variables or explicit construction for tests.

use std::time::Duration;

use docseal_core::{Address, GatewayLink, DEFAULT_GATEWAY};
use url::Url;
use zeroize::Zeroizing;

use crate::retry::RetryPolicy;

/// Configuration for the ledger and IPFS clients.
///
/// Custom `Debug` implementation redacts the `ledger_api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the ledger gateway.
    pub ledger_url: Url,
    /// Account the ledger handle signs and reads as. `None` acts as the zero
    /// address, which can read but not write.
    pub ledger_account: Option<Address>,
    /// Bearer token for the ledger gateway. Zeroized on drop.
    pub ledger_api_token: Option<Zeroizing<String>>,
    /// Base URL of the IPFS HTTP API.
    pub ipfs_api_url: Url,
    /// Public gateway used to build download links.
    pub gateway: GatewayLink,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Backoff schedule for ledger calls and IPFS transport failures.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("ledger_url", &self.ledger_url)
            .field("ledger_account", &self.ledger_account)
            .field(
                "ledger_api_token",
                &self.ledger_api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("ipfs_api_url", &self.ipfs_api_url)
            .field("gateway", &self.gateway.base())
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LEDGER_URL` (default: `http://127.0.0.1:8545`)
    /// - `LEDGER_ACCOUNT` (optional, `0x…` address)
    /// - `LEDGER_API_TOKEN` (optional)
    /// - `IPFS_API_URL` (default: `http://127.0.0.1:5001`)
    /// - `IPFS_GATEWAY_URL` (default: `https://ipfs.io/ipfs`)
    /// - `DOCSEAL_TIMEOUT_SECS` (default: 30)
    /// - `RPC_MAX_ATTEMPTS` (default: 3)
    /// - `RPC_INITIAL_DELAY_MS` (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let ledger_account = match std::env::var("LEDGER_ACCOUNT") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Address::new(&raw)
                    .map_err(|e| ConfigError::Invalid("LEDGER_ACCOUNT".into(), e.to_string()))?,
            ),
            _ => None,
        };
        let ledger_api_token = std::env::var("LEDGER_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(Zeroizing::new);
        let gateway_raw =
            std::env::var("IPFS_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY.to_string());
        let gateway = GatewayLink::new(&gateway_raw)
            .map_err(|e| ConfigError::InvalidUrl("IPFS_GATEWAY_URL".into(), e.to_string()))?;

        Ok(Self {
            ledger_url: env_url("LEDGER_URL", "http://127.0.0.1:8545")?,
            ledger_account,
            ledger_api_token,
            ipfs_api_url: env_url("IPFS_API_URL", "http://127.0.0.1:5001")?,
            gateway,
            timeout_secs: env_number("DOCSEAL_TIMEOUT_SECS", 30)?,
            retry: RetryPolicy::new(
                env_number("RPC_MAX_ATTEMPTS", u64::from(RetryPolicy::DEFAULT_MAX_ATTEMPTS))?
                    .try_into()
                    .map_err(|_| ConfigError::Invalid("RPC_MAX_ATTEMPTS".into(), "too large".into()))?,
                Duration::from_millis(env_number("RPC_INITIAL_DELAY_MS", 1000)?),
            ),
        })
    }

    /// Create a configuration pointing to local mock servers (for testing).
    ///
    /// Retries are fast (10 ms initial delay) so failure paths stay quick.
    pub fn local_mock(ledger_port: u16, ipfs_port: u16) -> Result<Self, ConfigError> {
        let make_url = |port: u16| -> Result<Url, ConfigError> {
            Url::parse(&format!("http://127.0.0.1:{port}"))
                .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))
        };
        Ok(Self {
            ledger_url: make_url(ledger_port)?,
            ledger_account: None,
            ledger_api_token: None,
            ipfs_api_url: make_url(ipfs_port)?,
            gateway: GatewayLink::new(DEFAULT_GATEWAY)
                .map_err(|e| ConfigError::InvalidUrl("gateway".into(), e.to_string()))?,
            timeout_secs: 5,
            retry: RetryPolicy::new(3, Duration::from_millis(10)),
        })
    }

    /// Act as `account`.
    pub fn with_account(mut self, account: Address) -> Self {
        self.ledger_account = Some(account);
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_number(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(var.to_string(), format!("not a number: {raw}"))),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL variable could not be parsed.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// A variable had an unusable value.
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = ClientConfig::local_mock(9000, 9001).unwrap();
        assert_eq!(cfg.ledger_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.ipfs_api_url.as_str(), "http://127.0.0.1:9001/");
        assert_eq!(cfg.timeout_secs, 5);
        assert!(cfg.ledger_account.is_none());
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("NONEXISTENT_DOCSEAL_VAR_12345", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("TEST_BAD_URL_DOCSEAL", "not a url");
        let result = env_url("TEST_BAD_URL_DOCSEAL", "https://example.com");
        std::env::remove_var("TEST_BAD_URL_DOCSEAL");
        assert!(result.is_err());
    }

    #[test]
    fn env_number_rejects_garbage() {
        std::env::set_var("TEST_BAD_NUMBER_DOCSEAL", "ten");
        let result = env_number("TEST_BAD_NUMBER_DOCSEAL", 3);
        std::env::remove_var("TEST_BAD_NUMBER_DOCSEAL");
        assert!(matches!(result, Err(ConfigError::Invalid(..))));
        assert_eq!(env_number("NONEXISTENT_DOCSEAL_NUMBER", 7).unwrap(), 7);
    }

    #[test]
    fn debug_redacts_token() {
        let mut cfg = ClientConfig::local_mock(9000, 9001).unwrap();
        cfg.ledger_api_token = Some(Zeroizing::new("super-secret".into()));
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
