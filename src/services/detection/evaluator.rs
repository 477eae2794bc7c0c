//! Per-post sponsorship evaluation.
//!
//! Stages run strictly in order and stop at the first positive one:
//!
//! 1. search snippet text
//! 2. crawl (failure ends the evaluation with an error)
//! 3. first image URL on a sponsor domain
//! 4. first sticker URL on a sponsor domain
//! 5. first image OCR
//! 6. first sticker OCR, then the second sticker
//! 7. first paragraph
//!
//! Legacy posts continue with the last paragraph, the last sticker and the
//! last image. Recent-era posts that stay negative are handed to the
//! background queue and come back with a pending indicator.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::analysis::{has_meaningful_sticker_text, Classification, Classifier};
use crate::models::{CrawlSnapshot, Indicator, OcrJob, PostVerdict, SearchHit, SourceTag};
use crate::ocr::sentinel;
use crate::scrapers::{BlogCrawler, CrawlError};
use crate::services::ocr::ImageTextExtractor;
use crate::services::queue::OcrDispatcher;
use crate::utils::strip_tags;

/// Error recorded on verdicts whose scope was cancelled.
pub const CANCELLED: &str = "cancelled";

pub struct PostEvaluator {
    crawler: Arc<dyn BlogCrawler>,
    ocr: Arc<dyn ImageTextExtractor>,
    dispatcher: Arc<dyn OcrDispatcher>,
    classifier: Arc<Classifier>,
}

/// Per-hit state threaded through the stages.
struct Run<'a> {
    cancel: &'a CancellationToken,
    /// Image URLs already sent to OCR for this hit.
    attempted: HashSet<String>,
}

enum Stage {
    Continue,
    Found(Classification),
    Pending(Indicator),
    Stop(String),
}

impl PostEvaluator {
    pub fn new(
        crawler: Arc<dyn BlogCrawler>,
        ocr: Arc<dyn ImageTextExtractor>,
        dispatcher: Arc<dyn OcrDispatcher>,
        classifier: Arc<Classifier>,
    ) -> Self {
        Self {
            crawler,
            ocr,
            dispatcher,
            classifier,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Evaluate one search hit. Never fails: problems land in `error`.
    pub async fn evaluate(&self, hit: SearchHit, cancel: &CancellationToken) -> PostVerdict {
        let is_recent_era = hit.is_recent_era();
        let mut verdict = PostVerdict::new(hit);
        let mut run = Run {
            cancel,
            attempted: HashSet::new(),
        };

        match self.run_stages(&verdict.hit, is_recent_era, &mut run).await {
            Stage::Found(found) => {
                verdict.mark_sponsored(found.probability, found.indicators);
            }
            Stage::Pending(indicator) => {
                verdict.sponsor_indicators.push(indicator);
            }
            Stage::Stop(error) => {
                verdict.error = Some(error);
            }
            Stage::Continue => {}
        }
        verdict
    }

    async fn run_stages(&self, hit: &SearchHit, is_recent_era: bool, run: &mut Run<'_>) -> Stage {
        let description = strip_tags(&hit.description);
        let found = self.classifier.classify(&description, SourceTag::Description);
        if found.is_sponsored {
            return Stage::Found(found);
        }
        if run.cancel.is_cancelled() {
            return Stage::Stop(CANCELLED.to_string());
        }

        let snapshot = match self.crawler.crawl(&hit.link, is_recent_era, run.cancel).await {
            Ok(snapshot) => snapshot,
            Err(CrawlError::Cancelled) => return Stage::Stop(CANCELLED.to_string()),
            Err(e) => {
                warn!("Crawl failed for {}: {}", hit.link, e);
                return Stage::Stop(e.to_string());
            }
        };

        match self.leading_stages(&snapshot, run).await {
            Stage::Continue => {}
            decided => return decided,
        }

        if is_recent_era {
            return self.hand_off(snapshot).await;
        }

        self.trailing_stages(&snapshot, run).await
    }

    /// Stages 3 to 7, shared by both eras.
    async fn leading_stages(&self, snapshot: &CrawlSnapshot, run: &mut Run<'_>) -> Stage {
        if let Some(found) = self.domain_match(&snapshot.first_image_url, SourceTag::Image) {
            return Stage::Found(found);
        }
        if let Some(found) = self.domain_match(&snapshot.first_sticker_url, SourceTag::Sticker) {
            return Stage::Found(found);
        }

        if let Some(found) = self.image_ocr(&snapshot.first_image_url, run).await {
            return Stage::Found(found);
        }
        if run.cancel.is_cancelled() {
            return Stage::Stop(CANCELLED.to_string());
        }

        if let Some(found) = self.sticker_ocr(&snapshot.first_sticker_url, run).await {
            return Stage::Found(found);
        }
        let second = &snapshot.second_sticker_url;
        if !second.is_empty() && *second != snapshot.first_sticker_url {
            if let Some(found) = self.domain_match(second, SourceTag::Sticker) {
                return Stage::Found(found);
            }
            if let Some(found) = self.sticker_ocr(second, run).await {
                return Stage::Found(found);
            }
        }
        if run.cancel.is_cancelled() {
            return Stage::Stop(CANCELLED.to_string());
        }

        self.text(&snapshot.first_paragraph, SourceTag::Paragraph)
    }

    /// Stages 8 to 10, legacy posts only.
    async fn trailing_stages(&self, snapshot: &CrawlSnapshot, run: &mut Run<'_>) -> Stage {
        if snapshot.last_paragraph != snapshot.first_paragraph {
            if let Stage::Found(found) = self.text(&snapshot.last_paragraph, SourceTag::Paragraph) {
                return Stage::Found(found);
            }
        }

        let last_sticker = &snapshot.last_sticker_url;
        if *last_sticker != snapshot.first_sticker_url {
            if let Some(found) = self.domain_match(last_sticker, SourceTag::Sticker) {
                return Stage::Found(found);
            }
            if let Some(found) = self.sticker_ocr(last_sticker, run).await {
                return Stage::Found(found);
            }
        }
        if run.cancel.is_cancelled() {
            return Stage::Stop(CANCELLED.to_string());
        }

        let last_image = &snapshot.last_image_url;
        if *last_image != snapshot.first_image_url {
            if let Some(found) = self.domain_match(last_image, SourceTag::Image) {
                return Stage::Found(found);
            }
            if let Some(found) = self.image_ocr(last_image, run).await {
                return Stage::Found(found);
            }
        }
        if run.cancel.is_cancelled() {
            return Stage::Stop(CANCELLED.to_string());
        }

        Stage::Continue
    }

    fn text(&self, text: &str, tag: SourceTag) -> Stage {
        if text.is_empty() {
            return Stage::Continue;
        }
        let found = self.classifier.classify(text, tag);
        if found.is_sponsored {
            Stage::Found(found)
        } else {
            Stage::Continue
        }
    }

    fn domain_match(&self, url: &str, tag: SourceTag) -> Option<Classification> {
        if url.is_empty() {
            return None;
        }
        let domain = self.classifier.tables().sponsor_domain_in(url)?;
        Some(Classification {
            is_sponsored: true,
            probability: crate::models::indicator::ABSOLUTE,
            indicators: vec![Indicator::domain_match(domain, url, tag)],
        })
    }

    async fn image_ocr(&self, url: &str, run: &mut Run<'_>) -> Option<Classification> {
        let text = self.recognize(url, run).await?;
        let found = self.classifier.classify(&text, SourceTag::ImageOcr);
        found.is_sponsored.then_some(found)
    }

    async fn sticker_ocr(&self, url: &str, run: &mut Run<'_>) -> Option<Classification> {
        let text = self.recognize(url, run).await?;
        if !has_meaningful_sticker_text(&text) {
            debug!("Sticker text too short for {}: {:?}", url, text);
            return None;
        }
        let found = self.classifier.classify(&text, SourceTag::StickerOcr);
        found.is_sponsored.then_some(found)
    }

    /// OCR an image at most once per hit. Sentinels and failures yield `None`.
    async fn recognize(&self, url: &str, run: &mut Run<'_>) -> Option<String> {
        if url.is_empty() || run.cancel.is_cancelled() {
            return None;
        }
        if !run.attempted.insert(url.to_string()) {
            return None;
        }
        if self.classifier.tables().is_excluded_image(url) {
            return None;
        }
        match self.ocr.extract_text(url, run.cancel).await {
            Ok(text) if sentinel::is_sentinel(&text) => {
                debug!("OCR skipped {}: {}", url, text);
                None
            }
            Ok(text) if text.is_empty() => None,
            Ok(text) => Some(text),
            Err(e) => {
                debug!("OCR failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Queue the remaining image work and mark the verdict as pending.
    async fn hand_off(&self, snapshot: CrawlSnapshot) -> Stage {
        let job = OcrJob::new(snapshot, true);
        let indicator = Indicator::pending(&job.job_id);
        let job_id = job.job_id.clone();
        if let Err(e) = self.dispatcher.dispatch(job).await {
            warn!("Failed to dispatch OCR job {}: {}", job_id, e);
        }
        Stage::Pending(indicator)
    }
}
