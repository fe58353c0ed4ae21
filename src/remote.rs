//! HTTP client for a storage service running in another process.
//!
//! Lets an analysis service read content and ask for duplicates over the
//! storage service's JSON API instead of opening the catalog itself.
//!
//! # Status mapping
//!
//! | Response | Error |
//! |----------|-------|
//! | `404` | [`Error::NotFound`] |
//! | other non-2xx on content fetch | [`Error::Storage`] |
//! | other non-2xx on duplicate query, bad JSON | [`Error::Upstream`] |
//! | connection error, timeout | [`Error::Upstream`] |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use antiplag_core::source::{ContentSource, DuplicateSource};
use antiplag_core::{DocumentId, Error, Result};

/// Body of `GET /files/plagiarism/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlagiarismResponse {
    #[serde(default, alias = "duplicateId")]
    plagiarism_file_id: Option<DocumentId>,
}

pub struct RemoteStorage {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteStorage {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ContentSource for RemoteStorage {
    async fn fetch_content(&self, id: DocumentId) -> Result<Vec<u8>> {
        let url = self.url(&format!("/files/{}", id));
        debug!(%url, "fetching content");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("GET {}: {}", url, e)))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound(id)),
            status if !status.is_success() => Err(Error::Storage(format!(
                "storage service returned {} for file {}",
                status, id
            ))),
            _ => {
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|e| Error::Upstream(format!("reading body of {}: {}", url, e)))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

#[async_trait]
impl DuplicateSource for RemoteStorage {
    async fn duplicate_of(&self, id: DocumentId) -> Result<Option<DocumentId>> {
        let url = self.url(&format!("/files/plagiarism/{}", id));
        debug!(%url, "querying duplicate");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("GET {}: {}", url, e)))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound(id)),
            status if !status.is_success() => Err(Error::Upstream(format!(
                "duplicate query for file {} returned {}",
                id, status
            ))),
            _ => {
                let body: PlagiarismResponse = resp
                    .json()
                    .await
                    .map_err(|e| Error::Upstream(format!("decoding {}: {}", url, e)))?;
                Ok(body.plagiarism_file_id)
            }
        }
    }
}
