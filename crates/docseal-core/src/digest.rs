//! # Content Digests
//!
//! A [`ContentDigest`] is the SHA-256 fingerprint of the embedded document
//! bytes. It is what the ledger stores next to a certificate and what a
//! verifier recomputes from a redistributed copy.
//!
//! ## Determinism Invariant
//!
//! Digest computation is a pure function of the input bytes. Nothing else
//! (time, salt, process state) is mixed in, so the issuer and any
//! independent verifier always arrive at the same 64-character hex string.

use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::ValidationError;

/// Read buffer size for streaming digests.
const READ_CHUNK: usize = 64 * 1024;

/// A SHA-256 content digest.
///
/// Serialises as 64 lowercase hex characters. Parsing accepts either case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap a raw 32-byte digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Constant-time equality, for comparisons against caller-supplied
    /// digests.
    pub fn ct_matches(&self, other: &ContentDigest) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 64 {
            return Err(ValidationError::InvalidDigest(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(trimmed, &mut bytes)
            .map_err(|_| ValidationError::InvalidDigest(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentDigest> for String {
    fn from(value: ContentDigest) -> Self {
        value.to_hex()
    }
}

/// Compute the SHA-256 digest of an in-memory byte slice.
pub fn sha256_digest(bytes: &[u8]) -> ContentDigest {
    let mut acc = Sha256Accumulator::new();
    acc.update(bytes);
    acc.finalize()
}

/// Compute the SHA-256 digest of a byte stream.
///
/// I/O errors from the reader are propagated unchanged.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut acc = Sha256Accumulator::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        acc.update(&buf[..n]);
    }
    Ok(acc.finalize())
}

/// Incremental SHA-256 hasher producing a [`ContentDigest`].
#[derive(Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start a new digest.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Feed more bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Consume the accumulator and return the digest.
    pub fn finalize(self) -> ContentDigest {
        ContentDigest(self.hasher.finalize().into())
    }
}
