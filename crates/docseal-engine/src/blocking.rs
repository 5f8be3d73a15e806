//! CPU-bound work off the async executor.

use docseal_core::{sha256_digest, ContentDigest};

use crate::error::EngineError;

/// Run `f` on the blocking pool.
pub(crate) async fn run<T, E, F>(f: F) -> Result<T, EngineError>
where
    T: Send + 'static,
    E: Into<EngineError> + Send + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?.map_err(Into::into)
}

/// SHA-256 of `bytes`, computed on the blocking pool.
pub async fn hash_document(bytes: Vec<u8>) -> Result<ContentDigest, EngineError> {
    run(move || Ok::<_, EngineError>(sha256_digest(&bytes))).await
}
