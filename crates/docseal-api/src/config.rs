//! Server configuration from the environment.

use std::path::PathBuf;

use docseal_client::ConfigError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory for staged documents.
    pub staging_dir: PathBuf,
    /// Whether to connect to the ledger gateway. Without it only
    /// `/calculatehash` and `/issue` are served; ledger routes return 503.
    pub ledger_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            staging_dir: std::env::temp_dir().join("docseal"),
            ledger_enabled: false,
        }
    }
}

impl AppConfig {
    /// Read `PORT`, `STAGING_DIR` and `LEDGER_ENABLED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT".into(), format!("not a port: {raw}")))?,
            Err(_) => defaults.port,
        };
        let staging_dir = std::env::var("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.staging_dir);
        let ledger_enabled = match std::env::var("LEDGER_ENABLED") {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                ConfigError::Invalid("LEDGER_ENABLED".into(), format!("not a boolean: {raw}"))
            })?,
            Err(_) => defaults.ledger_enabled,
        };
        Ok(Self {
            port,
            staging_dir,
            ledger_enabled,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_legacy_server() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert!(!config.ledger_enabled);
        assert!(config.staging_dir.ends_with("docseal"));
    }

    #[test]
    fn flags() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
