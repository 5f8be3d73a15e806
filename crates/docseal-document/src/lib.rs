//! # docseal-document: Document Handling
//!
//! Turns an uploaded document into the artifact that gets hashed and
//! published:
//!
//! - [`embed`] renders the certificate identifier onto every page.
//! - [`staging`] holds the embedded artifact on disk while it is hashed and
//!   published, and removes it when the guard is dropped.
//! - [`fixture`] builds small, valid PDFs for tests and demos.
//!
//! Only PDF is supported. [`MediaType`] is derived from the file extension,
//! and anything other than `.pdf` is rejected before any work is done.

pub mod document;
pub mod embed;
pub mod error;
pub mod fixture;
pub mod staging;

pub use document::{Document, MediaType};
pub use embed::{embed, stamp_text};
pub use error::DocumentError;
pub use staging::{DocumentStore, StagedDocument};
