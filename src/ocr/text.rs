//! Recognizer output cleanup and the page-segmentation fallback loop.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backend::{OcrBackend, OcrConfig, OcrError};

/// Maximum characters of OCR text kept per image.
pub const MAX_OCR_CHARS: usize = 1000;

/// Status lines tesseract prints that are not recognized text.
const NOISE_PREFIXES: &[&str] = &[
    "Warning",
    "Estimating resolution",
    "Detected ",
    "Tesseract Open Source",
    "Error in",
    "Empty page",
    "Image too small",
    "Too few characters",
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Drop status lines, collapse whitespace and cap the length.
pub fn clean_ocr_output(raw: &str) -> String {
    let kept: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !NOISE_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();
    let joined = kept.join(" ");
    let collapsed = WHITESPACE.replace_all(&joined, " ");
    collapsed
        .trim()
        .chars()
        .take(MAX_OCR_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Try the primary mode, then each fallback mode, until one yields text.
///
/// Returns an empty string when every mode comes back empty. A failed
/// attempt moves on to the next mode; a missing recognizer or cancellation
/// stops immediately.
pub async fn recognize_with_fallback(
    backend: &dyn OcrBackend,
    image: &Path,
    config: &OcrConfig,
    cancel: &CancellationToken,
) -> Result<String, OcrError> {
    let modes = std::iter::once(config.primary_psm).chain(config.fallback_psms.iter().copied());
    for psm in modes {
        match backend.recognize(image, psm, cancel).await {
            Ok(raw) => {
                let text = clean_ocr_output(&raw);
                if !text.is_empty() {
                    return Ok(text);
                }
                debug!("{} --psm {} produced no text", backend.name(), psm);
            }
            Err(OcrError::OcrFailed(msg)) => {
                debug!("{} --psm {} failed: {}", backend.name(), psm, msg);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    #[test]
    fn test_clean_strips_noise_lines() {
        let raw = "Estimating resolution as 212\nDetected 12 diacritics\n협찬 \n\n  받았습니다\n";
        assert_eq!(clean_ocr_output(raw), "협찬 받았습니다");
        assert_eq!(clean_ocr_output("Estimating resolution as 70\n"), "");
        assert_eq!(clean_ocr_output("   \n\t"), "");
    }

    #[test]
    fn test_clean_truncates() {
        let raw = "가".repeat(MAX_OCR_CHARS + 50);
        assert_eq!(clean_ocr_output(&raw).chars().count(), MAX_OCR_CHARS);
    }

    /// Returns scripted outputs per call and records the modes requested.
    struct ScriptedBackend {
        outputs: Mutex<Vec<Result<String, OcrError>>>,
        modes: Mutex<Vec<u8>>,
    }

    impl ScriptedBackend {
        fn new(outputs: Vec<Result<String, OcrError>>) -> Self {
            Self {
                outputs: Mutex::new(outputs),
                modes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OcrBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn recognize(
            &self,
            _image: &Path,
            psm: u8,
            _cancel: &CancellationToken,
        ) -> Result<String, OcrError> {
            self.modes.lock().unwrap().push(psm);
            let mut outputs = self.outputs.lock().unwrap();
            if outputs.is_empty() {
                Ok(String::new())
            } else {
                outputs.remove(0)
            }
        }
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_text() {
        let backend = ScriptedBackend::new(vec![
            Ok("Estimating resolution as 90".to_string()),
            Err(OcrError::OcrFailed("bad".to_string())),
            Ok("제공".to_string()),
        ]);
        let text = recognize_with_fallback(
            &backend,
            Path::new("x.png"),
            &OcrConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(text, "제공");
        assert_eq!(*backend.modes.lock().unwrap(), vec![6, 7, 8]);
    }

    #[tokio::test]
    async fn test_fallback_exhausts_all_modes() {
        let backend = ScriptedBackend::new(Vec::new());
        let text = recognize_with_fallback(
            &backend,
            Path::new("x.png"),
            &OcrConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(text.is_empty());
        assert_eq!(*backend.modes.lock().unwrap(), vec![6, 7, 8, 10, 11, 12]);
    }

    #[tokio::test]
    async fn test_cancellation_stops_fallback() {
        let backend = ScriptedBackend::new(vec![Err(OcrError::Cancelled)]);
        let err = recognize_with_fallback(
            &backend,
            Path::new("x.png"),
            &OcrConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OcrError::Cancelled));
        assert_eq!(backend.modes.lock().unwrap().len(), 1);
    }
}
