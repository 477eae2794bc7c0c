//! OCR a single image.

use console::style;
use tokio_util::sync::CancellationToken;

use super::FetchArgs;
use crate::cli::helpers::ocr_service;
use crate::cli::icons::{error, success, warn};
use crate::ocr::sentinel;
use crate::scrapers::HttpClient;
use crate::services::ImageTextExtractor;

pub async fn cmd_ocr(url: &str, fetch: &FetchArgs) -> anyhow::Result<()> {
    let client = HttpClient::new(fetch.user_agent.as_deref())?;
    let service = ocr_service(client, &fetch.tesseract, fetch.worker_url.clone());

    match service.extract_text(url, &CancellationToken::new()).await {
        Ok(text) if sentinel::is_sentinel(&text) => {
            println!("{} {}", warn(), style(text).yellow());
            Ok(())
        }
        Ok(text) => {
            println!("{} {} chars", success(), text.chars().count());
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", error(), e);
            Err(e.into())
        }
    }
}
