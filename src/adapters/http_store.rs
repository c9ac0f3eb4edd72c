//! Blob store over an S3-compatible HTTP endpoint.
//!
//! Objects live at `{base_url}/{bucket}/{key}`. Requests are unsigned, so
//! the endpoint must allow anonymous GET/PUT (a private network gateway or
//! a bucket policy scoped to the worker).

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{Hc50Error, Result, StorageFailure};
use crate::storage::{validate_key, BlobStore};

#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    http: Client,
    base: Url,
}

impl HttpBlobStore {
    pub fn new(base_url: &str, bucket: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| Hc50Error::Validation(format!("invalid storage base_url: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Hc50Error::Validation(format!(
                "storage base_url cannot be a base: {base_url}"
            )));
        }
        if let Some(bucket) = bucket.map(str::trim).filter(|b| !b.is_empty()) {
            base.path_segments_mut()
                .map_err(|_| Hc50Error::Validation("storage base_url has no path".to_string()))?
                .pop_if_empty()
                .push(bucket);
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn object_url(&self, key: &str) -> Result<Url> {
        validate_key(key)?;
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Hc50Error::Internal("storage base url has no path".to_string()))?
            .pop_if_empty()
            .extend(key.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.object_url(key)?;
        let io_error = |e: reqwest::Error| Hc50Error::storage_fetch(key, StorageFailure::Io, e.to_string());

        let resp = self.http.get(url).send().await.map_err(io_error)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(Hc50Error::storage_fetch(
                key,
                StorageFailure::NotFound,
                "object not found",
            )),
            status if status.is_success() => {
                let bytes = resp.bytes().await.map_err(io_error)?;
                debug!(key, bytes = bytes.len(), "fetched blob over http");
                Ok(bytes.to_vec())
            }
            status => Err(Hc50Error::storage_fetch(
                key,
                StorageFailure::Io,
                format!("unexpected status {status}"),
            )),
        }
    }

    async fn put_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let url = self.object_url(key).map_err(|e| Hc50Error::StorageWrite {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Hc50Error::StorageWrite {
                key: key.to_string(),
                reason: format!("unexpected status {}", resp.status()),
            });
        }
        Ok(())
    }
}
