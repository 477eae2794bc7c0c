//! OCR backend abstraction.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::sentinel;

/// Errors from downloading, preparing or recognizing an image.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image too large: {0} bytes")]
    ImageTooLarge(u64),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Not an image: {0}")]
    NotAnImage(String),

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR cancelled")]
    Cancelled,
}

impl OcrError {
    /// The bracketed placeholder reported in place of OCR text.
    pub fn sentinel(&self) -> &'static str {
        match self {
            OcrError::ImageTooLarge(_) => sentinel::TOO_LARGE,
            OcrError::Download(_) => sentinel::DOWNLOAD_FAILED,
            OcrError::NotAnImage(_) => sentinel::NOT_AN_IMAGE,
            OcrError::BackendNotAvailable(_) => sentinel::UNAVAILABLE,
            OcrError::Cancelled => sentinel::TIMEOUT,
            OcrError::OcrFailed(_) | OcrError::ImageError(_) | OcrError::Io(_) => {
                sentinel::UNRECOGNIZED
            }
        }
    }
}

/// Recognizer settings.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract language code.
    pub language: String,
    /// Page segmentation mode tried first.
    pub primary_psm: u8,
    /// Modes tried in order when the primary yields nothing.
    pub fallback_psms: Vec<u8>,
    /// OCR engine mode for the primary attempt.
    pub oem: u8,
    /// Deadline for each attempt.
    pub attempt_timeout: Duration,
    /// Recognizer executable.
    pub binary: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "kor".to_string(),
            primary_psm: 6,
            fallback_psms: vec![7, 8, 10, 11, 12],
            oem: 3,
            attempt_timeout: Duration::from_secs(4),
            binary: "tesseract".to_string(),
        }
    }
}

/// An out-of-process or in-process text recognizer.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether the recognizer can run on this machine.
    fn is_available(&self) -> bool;

    /// Recognize text in `image` using page segmentation mode `psm`.
    ///
    /// Returns raw recognizer output; an empty string means nothing was read.
    /// Must stop promptly, releasing any child process, when `cancel` fires.
    async fn recognize(
        &self,
        image: &Path,
        psm: u8,
        cancel: &CancellationToken,
    ) -> Result<String, OcrError>;
}
