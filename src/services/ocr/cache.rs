//! Process-wide OCR text cache keyed by image URL.

use dashmap::DashMap;

/// Recognized text per image URL. Sentinels and empty text are never stored.
#[derive(Debug, Default)]
pub struct OcrCache {
    entries: DashMap<String, String>,
}

impl OcrCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty cached text for `url`.
    pub fn get(&self, url: &str) -> Option<String> {
        self.entries
            .get(url)
            .map(|entry| entry.value().clone())
            .filter(|text| !text.is_empty())
    }

    pub fn insert(&self, url: &str, text: &str) {
        if text.is_empty() || crate::ocr::sentinel::is_sentinel(text) {
            return;
        }
        self.entries.insert(url.to_string(), text.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
