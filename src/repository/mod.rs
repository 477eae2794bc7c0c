//! Persistence for background OCR work.
//!
//! Two record kinds: `OcrResult` keyed by image URL (with lookup by job id)
//! and `JobVerdict` keyed by job id. The trait is the seam for a durable
//! key-value store; `MemoryOcrRepository` is the in-process backend.

mod memory;

pub use memory::MemoryOcrRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{JobVerdict, OcrResult};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Storage for OCR results and job state.
#[async_trait]
pub trait OcrRepository: Send + Sync {
    /// Store (or overwrite) the result for `result.image_url`.
    async fn save_result(&self, result: &OcrResult) -> Result<()>;

    async fn get_result(&self, image_url: &str) -> Result<Option<OcrResult>>;

    /// All results recorded for a job, oldest first.
    async fn results_for_job(&self, job_id: &str) -> Result<Vec<OcrResult>>;

    /// Store (or overwrite) the state of a job.
    async fn save_job(&self, verdict: &JobVerdict) -> Result<()>;

    async fn get_job(&self, job_id: &str) -> Result<Option<JobVerdict>>;
}
