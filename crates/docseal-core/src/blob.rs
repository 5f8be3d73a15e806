//! # Blob Store Collaborator
//!
//! A content-addressed network that durably replicates and pins published
//! artifacts. The returned [`ContentReference`] is derived from the bytes,
//! so two publishes of identical bytes return the same reference and a
//! later fetch yields byte-identical content.
//!
//! [`MemoryBlobStore`] keeps everything in process. It derives CIDv0-style
//! references (`Qm…`, base58btc of the sha2-256 multihash of the raw
//! bytes). These are stable and content-derived, but they are not the CIDs
//! an IPFS node would compute (IPFS wraps content in UnixFS first).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use thiserror::Error;

use crate::content::ContentReference;
use crate::digest::sha256_digest;

/// Multihash code for sha2-256.
const MULTIHASH_SHA2_256: u8 = 0x12;
/// Multihash digest length for sha2-256.
const MULTIHASH_LEN_32: u8 = 0x20;

/// Errors from the content-addressed network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// The network could not be reached.
    #[error("blob store transport error calling {endpoint}: {message}")]
    Transport {
        /// Endpoint or operation.
        endpoint: String,
        /// Transport failure description.
        message: String,
    },

    /// The network answered with a non-success status.
    #[error("blob store {endpoint} returned {status}: {body}")]
    Api {
        /// Endpoint or operation.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response could not be decoded.
    #[error("failed to decode blob store response from {endpoint}: {message}")]
    Deserialization {
        /// Endpoint or operation.
        endpoint: String,
        /// Decoding failure description.
        message: String,
    },

    /// Nothing is stored under this reference.
    #[error("content {0} not found")]
    NotFound(ContentReference),
}

/// A content-addressed, pinning artifact store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Replicate and pin `bytes`, returning their content reference.
    async fn publish(&self, bytes: &[u8]) -> Result<ContentReference, BlobError>;

    /// Dereference a content reference.
    async fn fetch(&self, reference: &ContentReference) -> Result<Vec<u8>, BlobError>;
}

/// In-process blob store for tests, demos, and the stub deployment.
///
/// Cheaply cloneable; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    blobs: DashMap<ContentReference, Vec<u8>>,
    pins: DashSet<ContentReference>,
    failures_remaining: AtomicU32,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the reference `bytes` would be published under.
    pub fn reference_for(bytes: &[u8]) -> ContentReference {
        let digest = sha256_digest(bytes);
        let mut multihash = Vec::with_capacity(34);
        multihash.push(MULTIHASH_SHA2_256);
        multihash.push(MULTIHASH_LEN_32);
        multihash.extend_from_slice(digest.as_bytes());
        // base58 output is always alphanumeric.
        ContentReference::from_derived(bs58::encode(multihash).into_string())
    }

    /// Make the next `n` publishes fail with a transport error.
    pub fn fail_next_publishes(&self, n: u32) {
        self.inner.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Whether `reference` is pinned.
    pub fn is_pinned(&self, reference: &ContentReference) -> bool {
        self.inner.pins.contains(reference)
    }

    /// Number of distinct stored artifacts.
    pub fn len(&self) -> usize {
        self.inner.blobs.len()
    }

    /// Whether nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_injected_failure(&self) -> bool {
        self.inner
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn publish(&self, bytes: &[u8]) -> Result<ContentReference, BlobError> {
        if self.take_injected_failure() {
            return Err(BlobError::Transport {
                endpoint: "memory://publish".into(),
                message: "injected failure".into(),
            });
        }
        let reference = Self::reference_for(bytes);
        self.inner
            .blobs
            .entry(reference.clone())
            .or_insert_with(|| bytes.to_vec());
        self.inner.pins.insert(reference.clone());
        tracing::debug!(cid = %reference, size = bytes.len(), "published to memory blob store");
        Ok(reference)
    }

    async fn fetch(&self, reference: &ContentReference) -> Result<Vec<u8>, BlobError> {
        self.inner
            .blobs
            .get(reference)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::NotFound(reference.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_is_content_addressed_and_pinned() {
        let store = MemoryBlobStore::new();
        let a = store.publish(b"hello").await.unwrap();
        let b = store.publish(b"hello").await.unwrap();
        let c = store.publish(b"world").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(store.is_pinned(&a));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn fetch_returns_identical_bytes() {
        let store = MemoryBlobStore::new();
        let r = store.publish(b"%PDF-1.5 body").await.unwrap();
        assert_eq!(store.fetch(&r).await.unwrap(), b"%PDF-1.5 body");
    }

    #[tokio::test]
    async fn fetch_unknown_reference_is_not_found() {
        let store = MemoryBlobStore::new();
        let r = MemoryBlobStore::reference_for(b"never published");
        assert_eq!(store.fetch(&r).await.unwrap_err(), BlobError::NotFound(r));
    }

    #[test]
    fn references_look_like_cid_v0() {
        let r = MemoryBlobStore::reference_for(b"anything");
        assert!(r.as_str().starts_with("Qm"));
        assert_eq!(r.as_str().len(), 46);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let store = MemoryBlobStore::new();
        store.fail_next_publishes(1);
        assert!(matches!(
            store.publish(b"x").await,
            Err(BlobError::Transport { .. })
        ));
        assert!(store.publish(b"x").await.is_ok());
    }
}
