//! Typed client for the IPFS HTTP API (Kubo RPC).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/api/v0/add?pin=true` | publish (multipart field `file`) |
//! | POST   | `/api/v0/cat?arg={cid}` | fetch |
//!
//! Transport failures are retried with the configured backoff. A non-2xx
//! status or an undecodable reply is returned at once.

use async_trait::async_trait;
use docseal_core::{BlobError, BlobStore, ContentReference};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::error::ClientError;
use crate::retry::{retry_send, RetryPolicy};

/// File name attached to uploads. IPFS ignores it for the CID.
const UPLOAD_FILE_NAME: &str = "certificate.pdf";

/// Reply of `/api/v0/add`.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size", default)]
    size: Option<String>,
}

/// IPFS-backed [`BlobStore`].
#[derive(Debug, Clone)]
pub struct IpfsBlobStore {
    http: reqwest::Client,
    api_url: Url,
    retry: RetryPolicy,
}

impl IpfsBlobStore {
    pub(crate) fn new(http: reqwest::Client, api_url: Url, retry: RetryPolicy) -> Self {
        Self {
            http,
            api_url,
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.as_str().trim_end_matches('/'), path)
    }

    /// Add and pin `bytes`.
    ///
    /// Calls `POST {api_url}/api/v0/add?pin=true`.
    pub async fn add(&self, bytes: &[u8]) -> Result<ContentReference, ClientError> {
        let endpoint = "POST /api/v0/add";
        let url = self.url("/api/v0/add?pin=true");

        let resp = retry_send(&self.retry, endpoint, || {
            // Multipart forms are consumed by send, so build one per attempt.
            let part = Part::bytes(bytes.to_vec()).file_name(UPLOAD_FILE_NAME);
            self.http
                .post(&url)
                .multipart(Form::new().part("file", part))
                .send()
        })
        .await
        .map_err(|e| ClientError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        let added: AddResponse = resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;
        let reference =
            ContentReference::new(&added.hash).map_err(|e| ClientError::InvalidResponse {
                endpoint: endpoint.into(),
                message: e.to_string(),
            })?;
        tracing::info!(cid = %reference, size = ?added.size, "published to IPFS");
        Ok(reference)
    }

    /// Read the content behind `reference`.
    ///
    /// Calls `POST {api_url}/api/v0/cat?arg={cid}`.
    pub async fn cat(&self, reference: &ContentReference) -> Result<Vec<u8>, ClientError> {
        let endpoint = "POST /api/v0/cat";
        let url = self.url(&format!("/api/v0/cat?arg={reference}"));

        let resp = retry_send(&self.retry, endpoint, || self.http.post(&url).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })
    }
}

#[async_trait]
impl BlobStore for IpfsBlobStore {
    async fn publish(&self, bytes: &[u8]) -> Result<ContentReference, BlobError> {
        Ok(self.add(bytes).await?)
    }

    async fn fetch(&self, reference: &ContentReference) -> Result<Vec<u8>, BlobError> {
        Ok(self.cat(reference).await?)
    }
}
