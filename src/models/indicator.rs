//! Sponsorship evidence attached to a verdict.

use serde::{Deserialize, Serialize};

/// Certain sponsorship (used for confirmed sponsor-agency domains).
pub const ABSOLUTE: f64 = 1.0;
/// Exact keyword or conjunctive pattern hit.
pub const EXACT: f64 = 0.9;
/// Threshold a weighted sum must exceed to count as sponsored.
pub const POSSIBLE: f64 = 0.7;

/// How strongly an indicator was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorType {
    ExactKeyword,
    WeightedKeyword,
    /// Analysis continues in the background.
    Pending,
}

/// Which rule family produced an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternType {
    SpecialConjunctive,
    ExactSubstring,
    Weighted,
    DomainMatch,
}

/// Where the analysed text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceTag {
    Description,
    Paragraph,
    Image,
    Sticker,
    ImageOcr,
    StickerOcr,
    Domain,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Paragraph => "paragraph",
            Self::Image => "image",
            Self::Sticker => "sticker",
            Self::ImageOcr => "imageOcr",
            Self::StickerOcr => "stickerOcr",
            Self::Domain => "domain",
        }
    }
}

/// The analysed input an indicator points back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSource {
    #[serde(rename = "sponsorType")]
    pub tag: SourceTag,
    pub text: String,
}

/// A single piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    #[serde(rename = "type")]
    pub indicator_type: IndicatorType,
    pub pattern: PatternType,
    pub matched_text: String,
    pub probability: f64,
    pub source: IndicatorSource,
}

impl Indicator {
    pub fn new(
        indicator_type: IndicatorType,
        pattern: PatternType,
        matched_text: impl Into<String>,
        probability: f64,
        tag: SourceTag,
        text: impl Into<String>,
    ) -> Self {
        Self {
            indicator_type,
            pattern,
            matched_text: matched_text.into(),
            probability,
            source: IndicatorSource {
                tag,
                text: text.into(),
            },
        }
    }

    /// Confirmed sponsor-agency domain found in an image or sticker URL.
    pub fn domain_match(domain: &str, url: &str, tag: SourceTag) -> Self {
        Self::new(
            IndicatorType::WeightedKeyword,
            PatternType::DomainMatch,
            domain,
            ABSOLUTE,
            tag,
            url,
        )
    }

    /// Placeholder for work handed to the background OCR queue.
    ///
    /// The source text carries the job id so clients can poll for the result.
    pub fn pending(job_id: &str) -> Self {
        Self::new(
            IndicatorType::Pending,
            PatternType::Weighted,
            "analysis in progress",
            0.0,
            SourceTag::Image,
            job_id,
        )
    }

    pub fn is_pending(&self) -> bool {
        self.indicator_type == IndicatorType::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_json_shape() {
        let indicator = Indicator::new(
            IndicatorType::ExactKeyword,
            PatternType::ExactSubstring,
            "원고료",
            EXACT,
            SourceTag::Description,
            "원고료를 받았습니다",
        );
        let json = serde_json::to_value(&indicator).unwrap();
        assert_eq!(json["type"], "exactKeyword");
        assert_eq!(json["pattern"], "exactSubstring");
        assert_eq!(json["matchedText"], "원고료");
        assert_eq!(json["source"]["sponsorType"], "description");
    }

    #[test]
    fn test_pending_indicator() {
        let indicator = Indicator::pending("job-1");
        assert!(indicator.is_pending());
        assert_eq!(indicator.probability, 0.0);
        assert_eq!(indicator.pattern, PatternType::Weighted);
        assert_eq!(indicator.source.tag, SourceTag::Image);
        assert_eq!(indicator.source.text, "job-1");
    }
}
