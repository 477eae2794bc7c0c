//! Queue consumer: one position per message.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{OcrQueue, QueueError};
use crate::analysis::{has_meaningful_sticker_text, Classification, Classifier};
use crate::models::{JobVerdict, OcrJob, OcrResult, Position};
use crate::ocr::sentinel;
use crate::repository::OcrRepository;
use crate::services::ocr::ImageTextExtractor;

pub struct OcrQueueWorker {
    queue: Arc<dyn OcrQueue>,
    repository: Arc<dyn OcrRepository>,
    ocr: Arc<dyn ImageTextExtractor>,
    classifier: Arc<Classifier>,
}

impl OcrQueueWorker {
    pub fn new(
        queue: Arc<dyn OcrQueue>,
        repository: Arc<dyn OcrRepository>,
        ocr: Arc<dyn ImageTextExtractor>,
        classifier: Arc<Classifier>,
    ) -> Self {
        Self {
            queue,
            repository,
            ocr,
            classifier,
        }
    }

    /// Consume jobs until `cancel` fires or the queue closes.
    pub async fn run(&self, cancel: &CancellationToken) {
        info!("OCR worker listening on {}", self.queue.name());
        while let Some(job) = self.queue.receive(cancel).await {
            if let Err(e) = self.process(&job, cancel).await {
                warn!("OCR job {} failed: {}", job.job_id, e);
            }
        }
        info!("OCR worker on {} stopped", self.queue.name());
    }

    /// Handle the job's current position.
    ///
    /// Returns the follow-up job when one was enqueued.
    pub async fn process(
        &self,
        job: &OcrJob,
        cancel: &CancellationToken,
    ) -> Result<Option<OcrJob>, QueueError> {
        let position = job.current_position;
        let url = job.current_url();

        let found = if url.is_empty() {
            debug!("Job {}: no image at {}", job.job_id, position.as_str());
            None
        } else {
            let (text, error) = match self.ocr.extract_text(url, cancel).await {
                Ok(text) => (text, None),
                Err(e) => (e.sentinel().to_string(), Some(e.to_string())),
            };
            // Interrupted OCR says nothing about the image; the job keeps its
            // last recorded state.
            if cancel.is_cancelled() {
                debug!("Job {} interrupted at {}", job.job_id, position.as_str());
                return Ok(None);
            }
            self.repository
                .save_result(&OcrResult {
                    image_url: url.to_string(),
                    job_id: job.job_id.clone(),
                    position,
                    ocr_text: text.clone(),
                    processed_at: Utc::now(),
                    error,
                })
                .await?;
            self.judge(position, &text)
        };

        if let Some(found) = found {
            info!(
                "Job {} sponsored at {} (p={})",
                job.job_id,
                position.as_str(),
                found.probability
            );
            self.repository
                .save_job(&JobVerdict::complete(
                    job,
                    found.probability,
                    found.indicators,
                ))
                .await?;
            return Ok(None);
        }

        match job.advance() {
            Some(next) => {
                self.repository.save_job(&JobVerdict::pending(&next)).await?;
                self.queue.enqueue(&next).await?;
                Ok(Some(next))
            }
            None => {
                debug!("Job {} finished without evidence", job.job_id);
                self.repository
                    .save_job(&JobVerdict::complete(job, 0.0, Vec::new()))
                    .await?;
                Ok(None)
            }
        }
    }

    fn judge(&self, position: Position, text: &str) -> Option<Classification> {
        if sentinel::is_sentinel(text) {
            return None;
        }
        if position.is_sticker() && !has_meaningful_sticker_text(text) {
            debug!("Sticker text too short: {:?}", text);
            return None;
        }
        let found = self.classifier.classify(text, position.ocr_source());
        found.is_sponsored.then_some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::models::{CrawlSnapshot, JobStatus, SourceTag};
    use crate::ocr::OcrError;
    use crate::repository::MemoryOcrRepository;
    use crate::services::queue::ChannelQueue;

    struct FakeOcr {
        texts: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeOcr {
        fn new(texts: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                texts: texts
                    .iter()
                    .map(|(u, t)| (u.to_string(), t.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ImageTextExtractor for FakeOcr {
        async fn extract_text(
            &self,
            url: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, OcrError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.texts.get(url) {
                Some(text) => Ok(text.clone()),
                None => Err(OcrError::Download("unreachable".to_string())),
            }
        }
    }

    struct Harness {
        queue: Arc<ChannelQueue>,
        repo: Arc<MemoryOcrRepository>,
        ocr: Arc<FakeOcr>,
        worker: OcrQueueWorker,
    }

    fn harness(texts: &[(&str, &str)]) -> Harness {
        let queue = Arc::new(ChannelQueue::new("ocr-test"));
        let repo = Arc::new(MemoryOcrRepository::new());
        let ocr = FakeOcr::new(texts);
        let worker = OcrQueueWorker::new(
            queue.clone(),
            repo.clone(),
            ocr.clone(),
            Arc::new(Classifier::default()),
        );
        Harness {
            queue,
            repo,
            ocr,
            worker,
        }
    }

    fn snapshot() -> CrawlSnapshot {
        let mut snapshot = CrawlSnapshot::new("https://blog.naver.com/a/1");
        snapshot.first_image_url = "https://img/1.jpg".to_string();
        snapshot.first_sticker_url = "https://sticker/1.png".to_string();
        snapshot.second_sticker_url = "https://sticker/2.png".to_string();
        snapshot.last_image_url = "https://img/9.jpg".to_string();
        snapshot.last_sticker_url = "https://sticker/9.png".to_string();
        snapshot
    }

    #[tokio::test]
    async fn test_positive_image_completes_job() {
        let h = harness(&[("https://img/1.jpg", "본 포스팅은 원고료를 받았습니다")]);
        let job = OcrJob::new(snapshot(), true);

        let next = h.worker.process(&job, &CancellationToken::new()).await.unwrap();
        assert!(next.is_none());

        let verdict = h.repo.get_job(&job.job_id).await.unwrap().unwrap();
        assert_eq!(verdict.status, JobStatus::Complete);
        assert!(verdict.is_sponsored);
        assert_eq!(verdict.probability, 0.9);
        assert_eq!(verdict.indicators[0].source.tag, SourceTag::ImageOcr);

        let stored = h.repo.get_result("https://img/1.jpg").await.unwrap().unwrap();
        assert_eq!(stored.job_id, job.job_id);
    }

    #[tokio::test]
    async fn test_negative_advances_and_enqueues() {
        let h = harness(&[("https://img/1.jpg", "맛있는 저녁")]);
        let job = OcrJob::new(snapshot(), true);

        let next = h
            .worker
            .process(&job, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.current_position, Position::FirstSticker);

        let queued = h.queue.receive(&CancellationToken::new()).await.unwrap();
        assert_eq!(queued, next);
        let state = h.repo.get_job(&job.job_id).await.unwrap().unwrap();
        assert_eq!(state.status, JobStatus::Pending);
        assert_eq!(state.current_position, Position::FirstSticker);
    }

    #[tokio::test]
    async fn test_short_sticker_text_is_not_classified() {
        // "ok" is short and has no Hangul, so the sticker stage is skipped.
        let h = harness(&[("https://sticker/1.png", "ok")]);
        let mut job = OcrJob::new(snapshot(), true);
        job.current_position = Position::FirstSticker;

        let next = h.worker.process(&job, &CancellationToken::new()).await.unwrap();
        assert_eq!(next.unwrap().current_position, Position::SecondSticker);
    }

    #[tokio::test]
    async fn test_recent_era_terminates_after_second_sticker() {
        let h = harness(&[("https://sticker/2.png", "감사합니다 좋은 하루")]);
        let mut job = OcrJob::new(snapshot(), true);
        job.current_position = Position::SecondSticker;

        let next = h.worker.process(&job, &CancellationToken::new()).await.unwrap();
        assert!(next.is_none());
        let verdict = h.repo.get_job(&job.job_id).await.unwrap().unwrap();
        assert_eq!(verdict.status, JobStatus::Complete);
        assert!(!verdict.is_sponsored);
        assert!(verdict.indicators.is_empty());
    }

    #[tokio::test]
    async fn test_failed_download_records_sentinel_and_moves_on() {
        let h = harness(&[]);
        let job = OcrJob::new(snapshot(), false);

        let next = h.worker.process(&job, &CancellationToken::new()).await.unwrap();
        assert_eq!(next.unwrap().current_position, Position::FirstSticker);

        let stored = h.repo.get_result("https://img/1.jpg").await.unwrap().unwrap();
        assert_eq!(stored.ocr_text, "[download failed]");
        assert!(stored.error.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_ocr_leaves_job_untouched() {
        let h = harness(&[("https://img/1.jpg", "[timeout]")]);
        let job = OcrJob::new(snapshot(), true);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let next = h.worker.process(&job, &cancel).await.unwrap();
        assert!(next.is_none());
        assert!(h.repo.get_result("https://img/1.jpg").await.unwrap().is_none());
        assert!(h.repo.get_job(&job.job_id).await.unwrap().is_none());
        assert_eq!(h.repo.job_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_position_is_skipped_without_ocr() {
        let h = harness(&[]);
        let mut snap = snapshot();
        snap.first_image_url.clear();
        let job = OcrJob::new(snap, false);

        let next = h.worker.process(&job, &CancellationToken::new()).await.unwrap();
        assert_eq!(next.unwrap().current_position, Position::FirstSticker);
        assert!(h.ocr.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_walks_legacy_job_to_the_end() {
        let h = harness(&[("https://sticker/9.png", "체험단 협찬 스티커")]);
        let job = OcrJob::new(snapshot(), false);
        h.queue.enqueue(&job).await.unwrap();

        let worker = Arc::new(h.worker);
        let cancel = CancellationToken::new();
        let handle = {
            let worker = worker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { worker.run(&cancel).await })
        };

        let mut verdict = None;
        for _ in 0..100 {
            if let Some(v) = h.repo.get_job(&job.job_id).await.unwrap() {
                if v.status == JobStatus::Complete {
                    verdict = Some(v);
                    break;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        let verdict = verdict.unwrap();
        assert!(verdict.is_sponsored);
        assert_eq!(verdict.current_position, Position::LastSticker);
        assert_eq!(h.ocr.calls.lock().unwrap().len(), 5);
    }
}
