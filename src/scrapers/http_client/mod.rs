//! HTTP client with browser headers, per-call deadlines and retry.

mod response;
mod user_agent;

pub use response::{HeadResponse, HttpResponse};
pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENT};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::utils::cancel::{pause, scoped, Interrupted};

/// Errors from a single fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("body too large ({0} bytes)")]
    TooLarge(u64),
    #[error("timed out")]
    TimedOut,
    #[error("cancelled")]
    Cancelled,
}

impl From<Interrupted> for FetchError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut => FetchError::TimedOut,
            Interrupted::Cancelled => FetchError::Cancelled,
        }
    }
}

/// How often and how patiently to retry page fetches.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(4),
        }
    }
}

/// HTTP client that looks like a Korean desktop browser.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a client.
    /// - None: desktop Chrome user agent
    /// - Some("impersonate"): random real browser user agent
    /// - Some(custom): custom user agent string
    pub fn new(user_agent_config: Option<&str>) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        let client = Client::builder()
            .user_agent(&user_agent)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, user_agent })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Access the underlying client for callers that build their own requests.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET under a deadline. Any status is returned to the caller.
    pub async fn get(
        &self,
        url: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        let response = scoped(cancel, timeout, self.client.get(url).send()).await??;
        Ok(HttpResponse::from_response(response))
    }

    /// HEAD under a deadline.
    pub async fn head(
        &self,
        url: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<HeadResponse, FetchError> {
        let response = scoped(cancel, timeout, self.client.head(url).send()).await??;
        Ok(HeadResponse::from_response(&response))
    }

    /// Fetch a page body, retrying failures with a fixed backoff.
    ///
    /// Each attempt (request and body) runs under `policy.timeout`.
    /// Non-200 responses count as failures. Cancellation stops immediately.
    pub async fn get_text_with_retry(
        &self,
        url: &str,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let mut last_err = FetchError::TimedOut;
        for attempt in 1..=policy.attempts.max(1) {
            match self.get_text_once(url, policy.timeout, cancel).await {
                Ok(body) => return Ok(body),
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(e) => {
                    debug!("GET {} attempt {} failed: {}", url, attempt, e);
                    last_err = e;
                }
            }
            if attempt < policy.attempts && !pause(cancel, policy.backoff).await {
                return Err(FetchError::Cancelled);
            }
        }
        Err(last_err)
    }

    async fn get_text_once(
        &self,
        url: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let fetch = async {
            let response = self.client.get(url).send().await?;
            if response.status() != StatusCode::OK {
                return Err(FetchError::Status(response.status()));
            }
            Ok(response.text().await?)
        };
        scoped(cancel, timeout, fetch).await?
    }
}
