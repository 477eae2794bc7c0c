//! Sponsorship text analysis.
//!
//! `patterns` holds the curated tables, `classifier` applies them.

pub mod classifier;
pub mod patterns;

pub use classifier::{has_meaningful_sticker_text, Classification, Classifier};
pub use patterns::{PatternTables, SpecialPattern, WeightedKeyword};
