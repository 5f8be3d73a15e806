//! # Validation Errors
//!
//! Errors raised when a domain primitive is constructed from untrusted
//! input. They carry the rejected value and the expected format so an
//! operator can see what was wrong without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Ledger address is not `0x` followed by 40 hex characters.
    #[error("invalid address: \"{0}\" (expected 0x followed by 40 hex characters)")]
    InvalidAddress(String),

    /// Certificate identifier is not a UUID.
    #[error("invalid certificate id: \"{0}\" (expected a UUID)")]
    InvalidCertificateId(String),

    /// Digest is not 64 hex characters.
    #[error("invalid digest: \"{0}\" (expected 64 hex characters)")]
    InvalidDigest(String),

    /// Content reference is empty or contains characters outside a CID alphabet.
    #[error("invalid content reference: \"{0}\"")]
    InvalidContentReference(String),

    /// Gateway base URL cannot be parsed or cannot carry path segments.
    #[error("invalid gateway URL: \"{0}\"")]
    InvalidGateway(String),

    /// A name field (certificate or profile name) is blank.
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_offending_input() {
        let err = ValidationError::InvalidAddress("0x12".into());
        assert!(err.to_string().contains("0x12"));
        let err = ValidationError::InvalidDigest("zz".into());
        assert!(err.to_string().contains("64 hex"));
        let err = ValidationError::EmptyName("certificate name");
        assert_eq!(err.to_string(), "certificate name must not be empty");
    }
}
