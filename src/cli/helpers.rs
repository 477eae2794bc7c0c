//! Shared helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;

use console::style;

use super::icons::{dim_arrow, info, success, warn};
use crate::analysis::PatternTables;
use crate::config::load_patterns;
use crate::models::{Indicator, PostVerdict};
use crate::ocr::{OcrConfig, TesseractBackend};
use crate::scrapers::HttpClient;
use crate::services::{ImageOcrService, OcrCache, OcrSettings};

/// Load pattern tables, reporting where they came from.
pub async fn load_tables(path: Option<&Path>) -> anyhow::Result<PatternTables> {
    let tables = load_patterns(path).await?;
    if let Some(path) = path {
        eprintln!("{} Patterns from {}", dim_arrow(), path.display());
    }
    Ok(tables)
}

/// OCR service backed by the local tesseract binary.
///
/// Without a worker URL failed downloads are not retried through a proxy.
pub fn ocr_service(
    client: HttpClient,
    tesseract: &str,
    worker_url: Option<String>,
) -> Arc<ImageOcrService> {
    let settings = OcrSettings {
        worker_url,
        recognizer: OcrConfig {
            binary: tesseract.to_string(),
            ..OcrConfig::default()
        },
        ..OcrSettings::default()
    };
    Arc::new(ImageOcrService::new(
        client,
        Arc::new(TesseractBackend::with_config(settings.recognizer.clone())),
        Arc::new(OcrCache::new()),
        settings,
    ))
}

/// One line per indicator.
pub fn print_indicators(indicators: &[Indicator]) {
    for indicator in indicators {
        println!(
            "  {} {} '{}' from {} (p={:.2})",
            dim_arrow(),
            style(format!("{:?}", indicator.pattern)).dim(),
            indicator.matched_text,
            indicator.source.tag.as_str(),
            indicator.probability
        );
    }
}

pub fn print_verdict(verdict: &PostVerdict) {
    let link = &verdict.hit.link;
    if let Some(error) = &verdict.error {
        println!("{} {} {}", warn(), link, style(error).yellow());
    } else if verdict.is_sponsored {
        println!(
            "{} {} {}",
            success(),
            link,
            style(format!("sponsored ({:.2})", verdict.sponsor_probability)).green()
        );
    } else if verdict.is_pending() {
        println!("{} {} {}", info(), link, style("pending OCR").cyan());
    } else {
        println!("{} {} {}", dim_arrow(), link, style("not sponsored").dim());
    }
    print_indicators(&verdict.sponsor_indicators);
}
