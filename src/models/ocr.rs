//! Background OCR jobs and their results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crawl::CrawlSnapshot;
use super::indicator::{Indicator, SourceTag};

/// An image slot in a crawl snapshot, in the order the queue visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    FirstImage,
    FirstSticker,
    SecondSticker,
    LastImage,
    LastSticker,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstImage => "firstImage",
            Self::FirstSticker => "firstSticker",
            Self::SecondSticker => "secondSticker",
            Self::LastImage => "lastImage",
            Self::LastSticker => "lastSticker",
        }
    }

    /// The position after this one, or `None` when the job is finished.
    ///
    /// Recent-era jobs stop after the second sticker; legacy jobs continue
    /// to the last image and last sticker.
    pub fn next(self, is_recent_era: bool) -> Option<Self> {
        match (self, is_recent_era) {
            (Self::FirstImage, _) => Some(Self::FirstSticker),
            (Self::FirstSticker, _) => Some(Self::SecondSticker),
            (Self::SecondSticker, true) => None,
            (Self::SecondSticker, false) => Some(Self::LastImage),
            (Self::LastImage, true) => None,
            (Self::LastImage, false) => Some(Self::LastSticker),
            (Self::LastSticker, _) => None,
        }
    }

    pub fn is_sticker(&self) -> bool {
        matches!(
            self,
            Self::FirstSticker | Self::SecondSticker | Self::LastSticker
        )
    }

    /// Source tag for text recognized at this position.
    pub fn ocr_source(&self) -> SourceTag {
        if self.is_sticker() {
            SourceTag::StickerOcr
        } else {
            SourceTag::ImageOcr
        }
    }

    /// The snapshot URL at this position (empty when not found).
    pub fn url_in<'a>(&self, snapshot: &'a CrawlSnapshot) -> &'a str {
        match self {
            Self::FirstImage => &snapshot.first_image_url,
            Self::FirstSticker => &snapshot.first_sticker_url,
            Self::SecondSticker => &snapshot.second_sticker_url,
            Self::LastImage => &snapshot.last_image_url,
            Self::LastSticker => &snapshot.last_sticker_url,
        }
    }
}

/// Queue message: the remaining OCR work for one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrJob {
    pub job_id: String,
    pub crawl_snapshot: CrawlSnapshot,
    pub current_position: Position,
    pub is_recent_era: bool,
    pub requested_at: DateTime<Utc>,
}

impl OcrJob {
    /// A fresh job starting at the first image.
    pub fn new(snapshot: CrawlSnapshot, is_recent_era: bool) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            crawl_snapshot: snapshot,
            current_position: Position::FirstImage,
            is_recent_era,
            requested_at: Utc::now(),
        }
    }

    pub fn current_url(&self) -> &str {
        self.current_position.url_in(&self.crawl_snapshot)
    }

    /// The same job moved to the next position, if any.
    pub fn advance(&self) -> Option<Self> {
        let next = self.current_position.next(self.is_recent_era)?;
        Some(Self {
            current_position: next,
            requested_at: Utc::now(),
            ..self.clone()
        })
    }
}

/// Text recognized for one image, keyed by image URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub image_url: String,
    pub job_id: String,
    pub position: Position,
    pub ocr_text: String,
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lifecycle of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Complete,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
        }
    }
}

/// Queue state and final outcome of a background job, keyed by job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobVerdict {
    pub job_id: String,
    pub status: JobStatus,
    pub current_position: Position,
    pub is_sponsored: bool,
    pub probability: f64,
    pub indicators: Vec<Indicator>,
    pub updated_at: DateTime<Utc>,
}

impl JobVerdict {
    /// State recorded when a job is dispatched or advanced.
    pub fn pending(job: &OcrJob) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: JobStatus::Pending,
            current_position: job.current_position,
            is_sponsored: false,
            probability: 0.0,
            indicators: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Terminal state.
    pub fn complete(job: &OcrJob, probability: f64, indicators: Vec<Indicator>) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: JobStatus::Complete,
            current_position: job.current_position,
            is_sponsored: !indicators.is_empty(),
            probability,
            indicators,
            updated_at: Utc::now(),
        }
    }
}
