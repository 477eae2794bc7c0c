//! In-process repository backed by concurrent maps.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{OcrRepository, Result};
use crate::models::{JobVerdict, OcrResult};

#[derive(Debug, Default)]
pub struct MemoryOcrRepository {
    results: DashMap<String, OcrResult>,
    jobs: DashMap<String, JobVerdict>,
}

impl MemoryOcrRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

#[async_trait]
impl OcrRepository for MemoryOcrRepository {
    async fn save_result(&self, result: &OcrResult) -> Result<()> {
        self.results
            .insert(result.image_url.clone(), result.clone());
        Ok(())
    }

    async fn get_result(&self, image_url: &str) -> Result<Option<OcrResult>> {
        Ok(self.results.get(image_url).map(|r| r.value().clone()))
    }

    async fn results_for_job(&self, job_id: &str) -> Result<Vec<OcrResult>> {
        let mut found: Vec<OcrResult> = self
            .results
            .iter()
            .filter(|r| r.job_id == job_id)
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| r.processed_at);
        Ok(found)
    }

    async fn save_job(&self, verdict: &JobVerdict) -> Result<()> {
        self.jobs.insert(verdict.job_id.clone(), verdict.clone());
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobVerdict>> {
        Ok(self.jobs.get(job_id).map(|j| j.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::models::{CrawlSnapshot, JobStatus, OcrJob, Position};

    fn result(url: &str, job_id: &str, position: Position, offset_ms: i64) -> OcrResult {
        OcrResult {
            image_url: url.to_string(),
            job_id: job_id.to_string(),
            position,
            ocr_text: "text".to_string(),
            processed_at: Utc::now() + Duration::milliseconds(offset_ms),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_results_by_url_and_job() {
        let repo = MemoryOcrRepository::new();
        repo.save_result(&result("b", "job-1", Position::FirstSticker, 10))
            .await
            .unwrap();
        repo.save_result(&result("a", "job-1", Position::FirstImage, 0))
            .await
            .unwrap();
        repo.save_result(&result("c", "job-2", Position::FirstImage, 0))
            .await
            .unwrap();

        let for_job = repo.results_for_job("job-1").await.unwrap();
        let urls: Vec<&str> = for_job.iter().map(|r| r.image_url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b"]);

        assert!(repo.get_result("c").await.unwrap().is_some());
        assert!(repo.get_result("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_job_state_overwrites() {
        let repo = MemoryOcrRepository::new();
        let job = OcrJob::new(CrawlSnapshot::new("https://blog.naver.com/a/1"), true);

        repo.save_job(&JobVerdict::pending(&job)).await.unwrap();
        repo.save_job(&JobVerdict::complete(&job, 0.0, Vec::new()))
            .await
            .unwrap();

        let stored = repo.get_job(&job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Complete);
        assert_eq!(repo.job_count(), 1);
    }
}
