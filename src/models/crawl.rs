//! Fields extracted from a crawled blog post.

use serde::{Deserialize, Serialize};

/// The fixed set of fields the evaluator looks at.
///
/// An empty string means "not found". Recent-era snapshots never populate the
/// `last_*` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSnapshot {
    pub url: String,
    #[serde(default)]
    pub first_paragraph: String,
    #[serde(default)]
    pub last_paragraph: String,
    #[serde(default)]
    pub first_image_url: String,
    #[serde(default)]
    pub last_image_url: String,
    #[serde(default)]
    pub first_sticker_url: String,
    #[serde(default)]
    pub second_sticker_url: String,
    #[serde(default)]
    pub last_sticker_url: String,
}

impl CrawlSnapshot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Drop everything the recent-era pipeline never looks at.
    pub fn into_recent_era(mut self) -> Self {
        self.last_paragraph.clear();
        self.last_image_url.clear();
        self.last_sticker_url.clear();
        self
    }
}
