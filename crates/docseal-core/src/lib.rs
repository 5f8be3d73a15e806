#![deny(missing_docs)]

//! # docseal-core: Foundational Types for DocSeal
//!
//! Every other crate in the workspace depends on this one. It defines the
//! values that flow through issuance and verification and the two
//! collaborator seams the pipeline talks to.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`CertificateId`] is not
//!    an [`Address`], and a [`ContentDigest`] is not a [`ContentReference`].
//!    String-based types validate at construction time.
//!
//! 2. **One digest path.** [`sha256_digest()`] and [`sha256_reader()`] are
//!    the only ways to produce a [`ContentDigest`] from bytes. Both are pure:
//!    no salts, no timestamps, identical bytes always give identical digests.
//!
//! 3. **Collaborators are traits.** The ledger ([`Ledger`]) and the
//!    content-addressed network ([`BlobStore`]) are injected as
//!    `Arc<dyn …>`; nothing reads ambient global state.
//!
//! 4. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod blob;
pub mod certificate;
pub mod content;
pub mod digest;
pub mod error;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod profile;

// Re-export primary types at crate root for ergonomic imports.
pub use blob::{BlobError, BlobStore, MemoryBlobStore};
pub use certificate::{CertificateRecord, CertificateStatus, TransitionError};
pub use content::{ContentReference, GatewayLink, DEFAULT_GATEWAY};
pub use digest::{sha256_digest, sha256_reader, ContentDigest, Sha256Accumulator};
pub use error::ValidationError;
pub use events::{AccountEvents, AccountHandler, Subscription};
pub use identity::{Address, CertificateId};
pub use ledger::{AccountStatus, Ledger, LedgerError, TxHash, TxStatus};
pub use profile::{Profile, Role};
