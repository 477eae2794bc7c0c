//! In-process OCR queue.
//!
//! Jobs travel as their JSON message encoding so the consumer sees exactly
//! what a remote broker would deliver.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{OcrQueue, QueueError};
use crate::models::OcrJob;

pub struct ChannelQueue {
    name: String,
    tx: mpsc::UnboundedSender<String>,
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ChannelQueue {
    /// Create a queue. `name` identifies the queue in logs.
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            tx,
            rx: Mutex::new(rx),
        }
    }
}

#[async_trait]
impl OcrQueue for ChannelQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, job: &OcrJob) -> Result<(), QueueError> {
        let message = serde_json::to_string(job)?;
        self.tx.send(message).map_err(|_| QueueError::Closed)
    }

    async fn receive(&self, cancel: &CancellationToken) -> Option<OcrJob> {
        let mut rx = self.rx.lock().await;
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => return None,
                message = rx.recv() => message?,
            };
            match serde_json::from_str::<OcrJob>(&message) {
                Ok(job) => return Some(job),
                Err(e) => warn!("Dropping malformed job on {}: {}", self.name, e),
            }
        }
    }
}
