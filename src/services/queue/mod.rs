//! Background OCR queue.
//!
//! Recent-era posts hand their remaining image work to this queue. Each
//! message is an `OcrJob` that covers one position; the worker processes it,
//! then either records a final verdict or enqueues the job at the next
//! position.

mod channel;
mod error;
mod worker;

pub use channel::ChannelQueue;
pub use error::QueueError;
pub use worker::OcrQueueWorker;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::{JobVerdict, OcrJob};
use crate::repository::OcrRepository;

/// A message queue carrying `OcrJob`s.
#[async_trait]
pub trait OcrQueue: Send + Sync {
    fn name(&self) -> &str;

    async fn enqueue(&self, job: &OcrJob) -> Result<(), QueueError>;

    /// Wait for the next job. `None` when the queue closes or `cancel` fires.
    async fn receive(&self, cancel: &CancellationToken) -> Option<OcrJob>;
}

/// Hands a fresh job to the background pipeline.
#[async_trait]
pub trait OcrDispatcher: Send + Sync {
    async fn dispatch(&self, job: OcrJob) -> Result<(), QueueError>;
}

/// Records the job as pending, then enqueues it.
pub struct QueueDispatcher {
    queue: Arc<dyn OcrQueue>,
    repository: Arc<dyn OcrRepository>,
}

impl QueueDispatcher {
    pub fn new(queue: Arc<dyn OcrQueue>, repository: Arc<dyn OcrRepository>) -> Self {
        Self { queue, repository }
    }
}

#[async_trait]
impl OcrDispatcher for QueueDispatcher {
    async fn dispatch(&self, job: OcrJob) -> Result<(), QueueError> {
        self.repository.save_job(&JobVerdict::pending(&job)).await?;
        self.queue.enqueue(&job).await?;
        debug!(
            "Dispatched OCR job {} to {} at {}",
            job.job_id,
            self.queue.name(),
            job.current_position.as_str()
        );
        Ok(())
    }
}
