//! # docseal-engine: Issuance and Verification
//!
//! The two halves of DocSeal, each composed from injected collaborators:
//!
//! - [`CertificationPipeline`] embeds an identifier into a document, hashes
//!   and publishes the result, and anchors the digest on the ledger.
//! - [`VerificationEngine`] checks submitted documents against the ledger
//!   and manages the certificate lifecycle (lookup, listing, invalidation,
//!   registration).
//!
//! Both take `Arc<dyn Ledger>` and (for issuance) `Arc<dyn BlobStore>`, so
//! the HTTP clients from `docseal-client` and the in-memory collaborators
//! from `docseal-core` / `docseal-ledger-stub` are interchangeable.
//!
//! Ledger calls go through the retry wrapper: reads are retried while they
//! fail transiently, and writes are submitted once and then polled for
//! confirmation. Embedding and hashing run on the blocking pool.

mod blocking;
pub mod error;
pub mod issue;
mod rpc;
pub mod verify;

pub use blocking::hash_document;
pub use error::{EngineError, ErrorKind};
pub use issue::{CertificationPipeline, PreparedCertificate};
pub use verify::{CertificateView, Verdict, VerificationEngine};
