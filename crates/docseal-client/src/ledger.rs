//! Typed client for the ledger gateway.
//!
//! Implements [`Ledger`] over the JSON protocol described in [`crate::wire`].
//! Calls are made once; retrying is left to the caller's
//! [`with_retry`](crate::retry::with_retry) so that the backoff budget is
//! applied in one place. Failures are classified as:
//!
//! | Failure | [`LedgerError`] |
//! |---------|-----------------|
//! | transport, 5xx, 408, 429 | `Transient` |
//! | 404 on a lookup | absent (`None`) |
//! | other 4xx | `Rejected` with the gateway's reason |
//! | undecodable body | `Protocol` |

use std::sync::Arc;

use async_trait::async_trait;
use docseal_core::{
    AccountEvents, AccountHandler, AccountStatus, Address, CertificateId, CertificateRecord,
    ContentDigest, ContentReference, Ledger, LedgerError, Profile, Subscription, TxHash, TxStatus,
};
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::ClientError;
use crate::wire::{
    IssueRequest, RegisterRequest, TxReceipt, VerifyRequest, VerifyResponse, ACCOUNT_HEADER,
};

/// HTTP ledger gateway client. Cheaply cloneable; clones share the acting
/// account and the subscriber list.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    http: reqwest::Client,
    base_url: Url,
    account: Arc<RwLock<Address>>,
    events: Arc<AccountEvents>,
}

impl HttpLedger {
    pub(crate) fn new(http: reqwest::Client, base_url: Url, account: Option<Address>) -> Self {
        Self {
            http,
            base_url,
            account: Arc::new(RwLock::new(account.unwrap_or_else(Address::zero))),
            events: Arc::new(AccountEvents::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Check the gateway's liveness endpoint.
    pub async fn health(&self) -> Result<(), ClientError> {
        let endpoint = "GET /health";
        let resp = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        if !resp.status().is_success() {
            return Err(ClientError::ApiError {
                endpoint: endpoint.into(),
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let account = self.account.read().clone();
        request
            .header(ACCOUNT_HEADER, account.as_str())
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }
        resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T, LedgerError> {
        let endpoint = format!("GET {path}");
        let result: Result<T, ClientError> = async {
            let resp = self.send(&endpoint, self.http.get(self.url(path))).await?;
            Self::decode(&endpoint, resp).await
        }
        .await;
        result.map_err(|e| e.into_ledger_error(operation))
    }

    /// Like [`Self::get_json`], but a 404 is an absent result.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> Result<Option<T>, LedgerError> {
        let endpoint = format!("GET {path}");
        let result: Result<Option<T>, ClientError> = async {
            let resp = self.send(&endpoint, self.http.get(self.url(path))).await?;
            if resp.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            Self::decode(&endpoint, resp).await.map(Some)
        }
        .await;
        result.map_err(|e| e.into_ledger_error(operation))
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, LedgerError> {
        let endpoint = format!("POST {path}");
        let result: Result<T, ClientError> = async {
            let mut request = self.http.post(self.url(path));
            if let Some(body) = body {
                request = request.json(body);
            }
            let resp = self.send(&endpoint, request).await?;
            Self::decode(&endpoint, resp).await
        }
        .await;
        result.map_err(|e| e.into_ledger_error(operation))
    }

    async fn submit<B: Serialize + Sync>(
        &self,
        operation: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<TxHash, LedgerError> {
        let receipt: TxReceipt = self.post_json(operation, path, body).await?;
        tracing::debug!(operation, tx = %receipt.tx_hash, "ledger transaction submitted");
        Ok(receipt.tx_hash)
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    fn account(&self) -> Address {
        self.account.read().clone()
    }

    fn switch_account(&self, account: Address) {
        *self.account.write() = account.clone();
        self.events.emit(&account);
    }

    fn on_account_changed(&self, handler: AccountHandler) -> Subscription {
        self.events.subscribe(handler)
    }

    async fn account_status(&self) -> Result<AccountStatus, LedgerError> {
        self.get_json("accountStatus", "/v1/account/status").await
    }

    async fn get_profile(&self) -> Result<Option<Profile>, LedgerError> {
        let profile: Option<Profile> = self.get_optional("getProfile", "/v1/account/profile").await?;
        Ok(profile.filter(Profile::is_registered))
    }

    async fn get_profile_by_address(&self, address: &Address) -> Result<Option<Profile>, LedgerError> {
        let profile: Option<Profile> = self
            .get_optional("getProfileByAddress", &format!("/v1/profiles/{address}"))
            .await?;
        Ok(profile.filter(Profile::is_registered))
    }

    async fn submit_register_user(&self, name: &str) -> Result<TxHash, LedgerError> {
        let body = RegisterRequest { name: name.into() };
        self.submit("registerUser", "/v1/users", Some(&body)).await
    }

    async fn submit_register_issuer(&self, name: &str) -> Result<TxHash, LedgerError> {
        let body = RegisterRequest { name: name.into() };
        self.submit("registerIssuer", "/v1/issuers", Some(&body)).await
    }

    async fn submit_issue_certificate(
        &self,
        name: &str,
        student: &Address,
        id: &CertificateId,
        digest: &ContentDigest,
        content_reference: &ContentReference,
    ) -> Result<TxHash, LedgerError> {
        let body = IssueRequest {
            name: name.into(),
            student_address: student.clone(),
            uuid: *id,
            digest: *digest,
            content_reference: content_reference.clone(),
        };
        self.submit("issueCertificate", "/v1/certificates", Some(&body))
            .await
    }

    async fn submit_invalidate_certificate(&self, id: &CertificateId) -> Result<TxHash, LedgerError> {
        self.submit::<()>(
            "invalidateCertificate",
            &format!("/v1/certificates/{id}/invalidate"),
            None,
        )
        .await
    }

    async fn transaction_status(&self, tx: &TxHash) -> Result<TxStatus, LedgerError> {
        self.get_json("transactionStatus", &format!("/v1/transactions/{tx}"))
            .await
    }

    async fn get_certificate(&self, id: &CertificateId) -> Result<Option<CertificateRecord>, LedgerError> {
        self.get_optional("getCertificate", &format!("/v1/certificates/{id}"))
            .await
    }

    async fn verify_certificate(
        &self,
        id: &CertificateId,
        issuer: &Address,
        student: &Address,
        digest: &ContentDigest,
    ) -> Result<bool, LedgerError> {
        let body = VerifyRequest {
            issuer_address: issuer.clone(),
            student_address: student.clone(),
            digest: *digest,
        };
        let resp: VerifyResponse = self
            .post_json(
                "verifyCertificate",
                &format!("/v1/certificates/{id}/verify"),
                Some(&body),
            )
            .await?;
        Ok(resp.valid)
    }

    async fn certificates_issued_for(&self, student: &Address) -> Result<Vec<CertificateId>, LedgerError> {
        self.get_json(
            "getCertificatesIssuedFor",
            &format!("/v1/accounts/{student}/certificates/issued-for"),
        )
        .await
    }

    async fn certificates_issued_by(&self, issuer: &Address) -> Result<Vec<CertificateId>, LedgerError> {
        self.get_json(
            "getCertificatesIssuedBy",
            &format!("/v1/accounts/{issuer}/certificates/issued-by"),
        )
        .await
    }
}
