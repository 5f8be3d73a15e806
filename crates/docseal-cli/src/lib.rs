//! # docseal-cli: Operator CLI for DocSeal
//!
//! ## Subcommands
//!
//! - `docseal hash <file>`: SHA-256 of a file, streamed.
//! - `docseal embed <file> --out <file>`: stamp a certificate identifier.
//! - `docseal issue <file> --name <n> --student <addr>`: full issuance.
//! - `docseal verify <file> --uuid --issuer --student`: exit 0 when
//!   authentic, 2 when not.
//! - `docseal show <uuid>`: record plus both parties' profiles.
//! - `docseal invalidate <uuid>`: issuer-only, one-way.
//! - `docseal register <name> [--issuer]`: register the configured account.
//!
//! `hash` and `embed` work offline. The rest read the ledger gateway and
//! IPFS settings from the environment.

pub mod certificate;
pub mod document;
