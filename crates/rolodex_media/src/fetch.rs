//! Downloading media from remote URLs.

use async_trait::async_trait;
use rolodex_error::{HttpError, RolodexResult};
use std::time::Duration;

/// Bytes downloaded from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    /// Response body
    pub bytes: Vec<u8>,
    /// `Content-Type` header, if the server sent one
    pub content_type: Option<String>,
}

/// Fetches remote media.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `url`. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> RolodexResult<FetchedMedia>;
}

/// [`MediaFetcher`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Duration, user_agent: &str) -> RolodexResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> RolodexResult<FetchedMedia> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::new(format!("{} returned {}", url, status)).into());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(format!("Failed to read body of {}: {}", url, e)))?;

        tracing::debug!(len = bytes.len(), ?content_type, "Fetched media");
        Ok(FetchedMedia {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
