//! Tesseract OCR backend implementation.
//!
//! Runs the `tesseract` command-line tool as a child process. The child is
//! spawned with `kill_on_drop`, so a timed-out or cancelled attempt never
//! leaves a recognizer running.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backend::{OcrBackend, OcrConfig, OcrError};
use crate::utils::cancel::{scoped, Interrupted};

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Command line for one attempt.
    ///
    /// The primary mode also pins the engine and keeps interword spacing.
    fn command(&self, image: &Path, psm: u8) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg(image)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .args(["--psm", &psm.to_string()]);
        if psm == self.config.primary_psm {
            cmd.args(["--oem", &self.config.oem.to_string()])
                .args(["-c", "preserve_interword_spaces=1"]);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        which::which(&self.config.binary).is_ok()
    }

    async fn recognize(
        &self,
        image: &Path,
        psm: u8,
        cancel: &CancellationToken,
    ) -> Result<String, OcrError> {
        let mut cmd = self.command(image, psm);
        match scoped(cancel, self.config.attempt_timeout, cmd.output()).await {
            Err(Interrupted::Cancelled) => Err(OcrError::Cancelled),
            Err(Interrupted::TimedOut) => {
                debug!("tesseract --psm {} timed out on {}", psm, image.display());
                Ok(String::new())
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr with kor data)".to_string(),
                ))
            }
            Ok(Err(e)) => Err(OcrError::Io(e)),
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
                }
            }
        }
    }
}
