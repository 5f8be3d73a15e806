//! # docseal-ledger-stub: In-Memory Certificate Ledger
//!
//! Stands in for the on-chain certificate contract during development and
//! tests:
//!
//! - [`LedgerBook`] holds profiles, certificates and transactions, and
//!   enforces the contract's rules.
//! - [`MemoryLedger`] is an in-process [`docseal_core::Ledger`] handle over a
//!   book. Several handles can share one book, each acting as a different
//!   account.
//! - [`routes::router`] serves a book over the ledger gateway protocol, so
//!   the HTTP client can be exercised end to end.
//!
//! Storage is in-memory with no persistence. Data is lost on restart.

pub mod book;
pub mod memory;
pub mod routes;

pub use book::{LedgerBook, RuleViolation};
pub use memory::MemoryLedger;
pub use routes::router;
