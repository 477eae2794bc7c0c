//! Keyword classifier for snippets, paragraphs and OCR text.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::PatternTables;
use crate::models::indicator::{EXACT, POSSIBLE};
use crate::models::{Indicator, IndicatorType, PatternType, SourceTag};

static HANGUL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[가-힣]{2,}").expect("valid hangul regex"));

/// Outcome of classifying one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_sponsored: bool,
    pub probability: f64,
    pub indicators: Vec<Indicator>,
}

impl Classification {
    fn negative() -> Self {
        Self {
            is_sponsored: false,
            probability: 0.0,
            indicators: Vec::new(),
        }
    }

    fn exact(indicator: Indicator) -> Self {
        Self {
            is_sponsored: true,
            probability: EXACT,
            indicators: vec![indicator],
        }
    }
}

/// Applies the pattern tables to text.
///
/// Passes run in decreasing specificity and the first one that matches
/// decides: special conjunctive patterns, then exact substrings, then the
/// weighted keyword sum. ASCII spaces are removed before matching because
/// OCR and HTML often split keywords.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    tables: PatternTables,
}

impl Classifier {
    pub fn new(tables: PatternTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &PatternTables {
        &self.tables
    }

    pub fn classify(&self, text: &str, source: SourceTag) -> Classification {
        if text.is_empty() {
            return Classification::negative();
        }
        let compact = text.replace(' ', "");

        for pattern in &self.tables.special {
            if !compact.contains(pattern.trigger.as_str()) {
                continue;
            }
            if let Some(companion) = pattern
                .companions
                .iter()
                .find(|c| compact.contains(c.as_str()))
            {
                return Classification::exact(Indicator::new(
                    IndicatorType::WeightedKeyword,
                    PatternType::SpecialConjunctive,
                    format!("{}, {}", pattern.trigger, companion),
                    EXACT,
                    source,
                    text,
                ));
            }
        }

        if let Some(keyword) = self
            .tables
            .exact
            .iter()
            .find(|k| compact.contains(k.as_str()))
        {
            return Classification::exact(Indicator::new(
                IndicatorType::ExactKeyword,
                PatternType::ExactSubstring,
                keyword.as_str(),
                EXACT,
                source,
                text,
            ));
        }

        let mut total = 0.0;
        let mut indicators = Vec::new();
        for entry in &self.tables.weighted {
            if compact.contains(entry.keyword.as_str()) {
                total += entry.weight;
                indicators.push(Indicator::new(
                    IndicatorType::WeightedKeyword,
                    PatternType::Weighted,
                    entry.keyword.as_str(),
                    entry.weight,
                    source,
                    text,
                ));
            }
        }

        Classification {
            is_sponsored: total > POSSIBLE,
            probability: total,
            indicators,
        }
    }
}

/// Whether sticker OCR output is worth classifying.
///
/// Sticker text without a run of two Hangul syllables and shorter than ten
/// characters is almost always recognizer noise.
pub fn has_meaningful_sticker_text(text: &str) -> bool {
    HANGUL_RUN.is_match(text) || text.chars().count() >= 10
}
