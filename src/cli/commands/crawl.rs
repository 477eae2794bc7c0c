//! Crawl a single post.

use std::path::Path;
use std::sync::Arc;

use console::style;
use tokio_util::sync::CancellationToken;

use super::FetchArgs;
use crate::cli::helpers::load_tables;
use crate::cli::icons::{dim_arrow, info};
use crate::scrapers::{BlogCrawler, HttpClient, WebBlogCrawler};

pub async fn cmd_crawl(
    patterns: Option<&Path>,
    url: &str,
    recent: bool,
    fetch: &FetchArgs,
) -> anyhow::Result<()> {
    let tables = load_tables(patterns).await?;
    let client = HttpClient::new(fetch.user_agent.as_deref())?;
    let crawler = WebBlogCrawler::new(client, Arc::new(tables));

    println!("{} Crawling {}", info(), url);
    let snapshot = crawler.crawl(url, recent, &CancellationToken::new()).await?;

    let fields = [
        ("first paragraph", &snapshot.first_paragraph),
        ("last paragraph", &snapshot.last_paragraph),
        ("first image", &snapshot.first_image_url),
        ("last image", &snapshot.last_image_url),
        ("first sticker", &snapshot.first_sticker_url),
        ("second sticker", &snapshot.second_sticker_url),
        ("last sticker", &snapshot.last_sticker_url),
    ];
    for (name, value) in fields {
        let shown = if value.is_empty() {
            style("-".to_string()).dim()
        } else {
            style(value.clone())
        };
        println!("  {} {:<16} {}", dim_arrow(), name, shown);
    }
    Ok(())
}
