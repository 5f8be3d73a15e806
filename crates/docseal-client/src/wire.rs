//! Request and response bodies of the ledger gateway protocol.
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET    | `/v1/account/status` | | [`docseal_core::AccountStatus`] |
//! | GET    | `/v1/account/profile` | | `Profile` / 404 |
//! | GET    | `/v1/profiles/{address}` | | `Profile` / 404 |
//! | POST   | `/v1/users` | [`RegisterRequest`] | [`TxReceipt`] |
//! | POST   | `/v1/issuers` | [`RegisterRequest`] | [`TxReceipt`] |
//! | POST   | `/v1/certificates` | [`IssueRequest`] | [`TxReceipt`] |
//! | POST   | `/v1/certificates/{uuid}/invalidate` | | [`TxReceipt`] |
//! | GET    | `/v1/certificates/{uuid}` | | `CertificateRecord` / 404 |
//! | POST   | `/v1/certificates/{uuid}/verify` | [`VerifyRequest`] | [`VerifyResponse`] |
//! | GET    | `/v1/accounts/{address}/certificates/issued-by` | | `[uuid]` |
//! | GET    | `/v1/accounts/{address}/certificates/issued-for` | | `[uuid]` |
//! | GET    | `/v1/transactions/{txHash}` | | `TxStatus` |
//! | GET    | `/health` | | 200 |
//!
//! Every call carries the acting account in [`ACCOUNT_HEADER`].

use docseal_core::{Address, CertificateId, ContentDigest, ContentReference, TxHash};
use serde::{Deserialize, Serialize};

/// Header naming the account a request acts as.
pub const ACCOUNT_HEADER: &str = "x-ledger-account";

/// Registration of the acting account as a user or issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
}

/// Certificate issuance by the acting account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub name: String,
    pub student_address: Address,
    pub uuid: CertificateId,
    pub digest: ContentDigest,
    pub content_reference: ContentReference,
}

/// Authenticity check against a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub issuer_address: Address,
    pub student_address: Address,
    pub digest: ContentDigest,
}

/// Result of a [`VerifyRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Acknowledgement of a submitted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: TxHash,
}
