//! Blog search API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::SearchHit;
use crate::scrapers::HttpClient;
use crate::utils::cancel::{scoped, Interrupted};

pub const DEFAULT_SEARCH_URL: &str = "https://openapi.naver.com/v1/search/blog.json";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search API returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("unreadable search response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("search request timed out")]
    TimedOut,
    #[error("search cancelled")]
    Cancelled,
}

impl From<Interrupted> for SearchError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut => SearchError::TimedOut,
            Interrupted::Cancelled => SearchError::Cancelled,
        }
    }
}

/// One page of upstream results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<SearchHit>,
}

/// Upstream search API.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// `start` is 1-based.
    async fn search_blog(
        &self,
        query: &str,
        display: u32,
        start: u32,
        cancel: &CancellationToken,
    ) -> Result<SearchPage, SearchError>;
}

/// Credentials and endpoint for the blog search API.
#[derive(Debug, Clone)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub search_url: String,
}

pub struct NaverSearchClient {
    http: HttpClient,
    credentials: NaverCredentials,
    timeout: Duration,
}

impl NaverSearchClient {
    pub fn new(http: HttpClient, credentials: NaverCredentials) -> Self {
        Self {
            http,
            credentials,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SearchApi for NaverSearchClient {
    async fn search_blog(
        &self,
        query: &str,
        display: u32,
        start: u32,
        cancel: &CancellationToken,
    ) -> Result<SearchPage, SearchError> {
        let display_count = display;
        debug!("Searching '{}' display={} start={}", query, display_count, start);
        let request = self
            .http
            .inner()
            .get(&self.credentials.search_url)
            .query(&[
                ("query", query.to_string()),
                ("display", display.to_string()),
                ("start", start.to_string()),
                ("sort", "sim".to_string()),
            ])
            .header("X-Naver-Client-Id", &self.credentials.client_id)
            .header("X-Naver-Client-Secret", &self.credentials.client_secret);

        let (status, body) = scoped(cancel, self.timeout, async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await??;

        if status != StatusCode::OK {
            return Err(SearchError::Upstream { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
