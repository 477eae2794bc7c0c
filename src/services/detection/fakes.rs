//! In-memory collaborators for detection tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::models::{CrawlSnapshot, OcrJob};
use crate::ocr::OcrError;
use crate::scrapers::{BlogCrawler, CrawlError};
use crate::services::ocr::ImageTextExtractor;
use crate::services::queue::{OcrDispatcher, QueueError};

pub(crate) struct FakeCrawler {
    pub snapshot: Option<CrawlSnapshot>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl BlogCrawler for FakeCrawler {
    async fn crawl(
        &self,
        url: &str,
        is_recent_era: bool,
        _cancel: &CancellationToken,
    ) -> Result<CrawlSnapshot, CrawlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.snapshot {
            Some(s) if is_recent_era => Ok(s.clone().into_recent_era()),
            Some(s) => Ok(s.clone()),
            None => Err(CrawlError::InvalidUrl(url.to_string())),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeOcr {
    pub texts: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageTextExtractor for FakeOcr {
    async fn extract_text(
        &self,
        url: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, OcrError> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self.texts.get(url).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct FakeDispatcher {
    pub jobs: Mutex<Vec<OcrJob>>,
    pub fail: bool,
}

#[async_trait]
impl OcrDispatcher for FakeDispatcher {
    async fn dispatch(&self, job: OcrJob) -> Result<(), QueueError> {
        self.jobs.lock().unwrap().push(job);
        if self.fail {
            return Err(QueueError::Closed);
        }
        Ok(())
    }
}
