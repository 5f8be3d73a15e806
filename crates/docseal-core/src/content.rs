//! # Content References
//!
//! A [`ContentReference`] is the address a content-addressed network hands
//! back when an artifact is published (an IPFS CID). It is a function of the
//! content itself, so dereferencing it always yields the published bytes.
//!
//! [`GatewayLink`] turns a reference into the public download URL the
//! certificate holder receives:
//! `<gateway>/<cid>?filename=<uuid>.<ext>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;
use crate::identity::CertificateId;

/// Default public IPFS gateway.
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io/ipfs";

/// Immutable address of a published artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentReference(String);

impl ContentReference {
    /// Validate a content reference.
    ///
    /// CIDs are base-encoded (base58btc for v0, base32 for v1), so only ASCII
    /// alphanumerics are accepted.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidContentReference(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wrap a reference this crate derived itself.
    pub(crate) fn from_derived(s: String) -> Self {
        Self(s)
    }

    /// Return the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentReference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentReference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ContentReference> for String {
    fn from(value: ContentReference) -> Self {
        value.0
    }
}

/// Builder for public gateway download links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayLink {
    base: Url,
}

impl GatewayLink {
    /// Create a link builder for a gateway base URL such as `https://ipfs.io/ipfs`.
    pub fn new(base: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(base.trim()).map_err(|_| ValidationError::InvalidGateway(base.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ValidationError::InvalidGateway(base.to_string()));
        }
        Ok(Self { base: url })
    }

    /// The gateway base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Build `<gateway>/<cid>?filename=<uuid>.<ext>`.
    pub fn link(&self, reference: &ContentReference, id: &CertificateId, extension: &str) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(reference.as_str());
        }
        url.query_pairs_mut()
            .append_pair("filename", &format!("{id}.{}", extension.trim_start_matches('.')));
        url
    }
}
