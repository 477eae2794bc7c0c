//! Blog post crawler.
//!
//! Resolves the real content document for a post URL (the primary platform
//! wraps posts in a frameset whose `mainFrame` holds the body), then extracts
//! the fixed field set used by the evaluator.

mod extract;
mod platform;

pub use extract::{clean_text, extract_snapshot, find_main_frame, upgrade_image_quality};
pub use platform::{normalize_url, resolve_frame_src, Platform, PlatformHosts};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::http_client::{FetchError, HttpClient, RetryPolicy};
use crate::analysis::PatternTables;
use crate::models::CrawlSnapshot;

/// Errors from crawling one post.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid url '{0}'")]
    InvalidUrl(String),
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("crawl failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("crawl cancelled")]
    Cancelled,
}

impl CrawlError {
    fn fetch(url: &str, source: FetchError) -> Self {
        match source {
            FetchError::Cancelled => CrawlError::Cancelled,
            source => CrawlError::Fetch {
                url: url.to_string(),
                source,
            },
        }
    }
}

/// Fetches a post and extracts its snapshot.
#[async_trait]
pub trait BlogCrawler: Send + Sync {
    async fn crawl(
        &self,
        url: &str,
        is_recent_era: bool,
        cancel: &CancellationToken,
    ) -> Result<CrawlSnapshot, CrawlError>;
}

/// Crawler for the two supported blog platforms.
pub struct WebBlogCrawler {
    client: HttpClient,
    hosts: PlatformHosts,
    retry: RetryPolicy,
    tables: Arc<PatternTables>,
}

impl WebBlogCrawler {
    pub fn new(client: HttpClient, tables: Arc<PatternTables>) -> Self {
        Self {
            client,
            hosts: PlatformHosts::default(),
            retry: RetryPolicy::default(),
            tables,
        }
    }

    pub fn with_hosts(mut self, hosts: PlatformHosts) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String, CrawlError> {
        self.client
            .get_text_with_retry(url, self.retry, cancel)
            .await
            .map_err(|e| CrawlError::fetch(url, e))
    }
}

#[async_trait]
impl BlogCrawler for WebBlogCrawler {
    async fn crawl(
        &self,
        url: &str,
        is_recent_era: bool,
        cancel: &CancellationToken,
    ) -> Result<CrawlSnapshot, CrawlError> {
        let normalized = normalize_url(url);
        let parsed =
            Url::parse(&normalized).map_err(|_| CrawlError::InvalidUrl(url.to_string()))?;
        let platform = self
            .hosts
            .detect(&parsed)
            .ok_or_else(|| CrawlError::UnsupportedPlatform(parsed.host_str().unwrap_or(url).to_string()))?;

        let outer = self.fetch(&normalized, cancel).await?;

        let body = match platform {
            Platform::Primary => match find_main_frame(&outer) {
                Some(src) => {
                    let inner_url =
                        resolve_frame_src(&parsed, &src, &self.hosts.primary_base_url)
                            .map_err(|_| CrawlError::InvalidUrl(src.clone()))?;
                    debug!("Resolved mainFrame for {} -> {}", normalized, inner_url);
                    self.fetch(&inner_url, cancel).await?
                }
                None => {
                    debug!("No mainFrame in {}, extracting outer document", normalized);
                    outer
                }
            },
            Platform::Secondary => outer,
        };

        Ok(extract_snapshot(
            &body,
            &normalized,
            platform,
            is_recent_era,
            &self.tables,
        ))
    }
}
