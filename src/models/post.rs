//! Search hits and per-post verdicts.

use serde::{Deserialize, Serialize};

use super::indicator::Indicator;

/// One result from the blog search API, kept verbatim.
///
/// The upstream API uses lowercase keys for the blogger fields and the
/// post date; both spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "bloggername")]
    pub blogger_name: String,
    #[serde(default, alias = "bloggerlink")]
    pub blogger_link: String,
    #[serde(default, alias = "postdate")]
    pub post_date: String,
}

impl SearchHit {
    /// Whether the post was published in the recent era (2025 or later).
    ///
    /// The date is `YYYYMMDD`; anything that does not start with a year
    /// counts as legacy.
    pub fn is_recent_era(&self) -> bool {
        crate::utils::date::is_recent_era(&self.post_date)
    }
}

/// A search hit together with the sponsorship decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVerdict {
    #[serde(flatten)]
    pub hit: SearchHit,
    pub is_sponsored: bool,
    pub sponsor_probability: f64,
    pub sponsor_indicators: Vec<Indicator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostVerdict {
    /// Start a verdict with no evidence.
    pub fn new(hit: SearchHit) -> Self {
        Self {
            hit,
            is_sponsored: false,
            sponsor_probability: 0.0,
            sponsor_indicators: Vec::new(),
            error: None,
        }
    }

    /// A verdict for a post that could not be evaluated.
    pub fn failed(hit: SearchHit, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(hit)
        }
    }

    /// Record positive evidence. A sponsored verdict never carries an error.
    pub fn mark_sponsored(&mut self, probability: f64, indicators: Vec<Indicator>) {
        self.is_sponsored = true;
        self.sponsor_probability = probability;
        self.sponsor_indicators.extend(indicators);
        self.error = None;
    }

    pub fn is_pending(&self) -> bool {
        self.sponsor_indicators.iter().any(Indicator::is_pending)
    }
}
