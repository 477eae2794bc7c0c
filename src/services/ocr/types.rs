//! OCR service settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::ocr::{OcrConfig, MAX_IMAGE_BYTES};

/// Download and recognition limits for image OCR.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    /// Forwarding endpoint used when a direct download fails (`?url=` is appended).
    pub worker_url: Option<String>,
    /// Directory for downloaded and cropped images.
    pub temp_dir: PathBuf,
    pub max_bytes: u64,
    pub head_timeout: Duration,
    pub download_timeout: Duration,
    /// Hosts of the blog CDN that accept a rendition size selector.
    pub resizable_hosts: Vec<String>,
    /// Size selector appended to resizable image URLs.
    pub rendition: String,
    pub recognizer: OcrConfig,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            worker_url: None,
            temp_dir: std::env::temp_dir(),
            max_bytes: MAX_IMAGE_BYTES,
            head_timeout: Duration::from_secs(2),
            download_timeout: Duration::from_secs(4),
            resizable_hosts: vec!["pstatic.net".to_string()],
            rendition: "w773".to_string(),
            recognizer: OcrConfig::default(),
        }
    }
}
