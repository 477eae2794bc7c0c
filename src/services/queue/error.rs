//! OCR queue error types.

use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue is closed")]
    Closed,
    #[error("Invalid job message: {0}")]
    Message(#[from] serde_json::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
