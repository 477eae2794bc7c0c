//! Evaluate one post, optionally finishing its background OCR inline.

use std::path::Path;
use std::sync::Arc;

use console::style;
use tokio_util::sync::CancellationToken;

use super::FetchArgs;
use crate::analysis::Classifier;
use crate::cli::helpers::{load_tables, ocr_service, print_indicators, print_verdict};
use crate::cli::icons::{info, success};
use crate::models::{JobStatus, SearchHit};
use crate::repository::{MemoryOcrRepository, OcrRepository};
use crate::scrapers::{HttpClient, WebBlogCrawler};
use crate::services::{ChannelQueue, OcrQueue, OcrQueueWorker, PostEvaluator, QueueDispatcher};

pub struct EvaluateOptions {
    pub description: String,
    pub date: String,
    pub follow: bool,
    pub json: bool,
}

pub async fn cmd_evaluate(
    patterns: Option<&Path>,
    url: &str,
    options: EvaluateOptions,
    fetch: &FetchArgs,
) -> anyhow::Result<()> {
    let tables = load_tables(patterns).await?;
    let client = HttpClient::new(fetch.user_agent.as_deref())?;
    let ocr = ocr_service(client.clone(), &fetch.tesseract, fetch.worker_url.clone());
    let classifier = Arc::new(Classifier::new(tables.clone()));

    let queue = Arc::new(ChannelQueue::new("cli"));
    let repository = Arc::new(MemoryOcrRepository::new());
    let evaluator = PostEvaluator::new(
        Arc::new(WebBlogCrawler::new(client, Arc::new(tables))),
        ocr.clone(),
        Arc::new(QueueDispatcher::new(queue.clone(), repository.clone())),
        classifier.clone(),
    );

    let hit = SearchHit {
        link: url.to_string(),
        description: options.description,
        post_date: options.date,
        ..SearchHit::default()
    };
    let cancel = CancellationToken::new();
    let verdict = evaluator.evaluate(hit, &cancel).await;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_verdict(&verdict);
    }
    if !options.follow || !verdict.is_pending() {
        return Ok(());
    }

    let worker = OcrQueueWorker::new(queue.clone(), repository.clone(), ocr, classifier);
    let Some(mut job) = queue.receive(&cancel).await else {
        return Ok(());
    };
    let job_id = job.job_id.clone();
    println!("{} Following OCR job {}", info(), style(&job_id).dim());
    while worker.process(&job, &cancel).await?.is_some() {
        match queue.receive(&cancel).await {
            Some(queued) => job = queued,
            None => break,
        }
    }

    let Some(outcome) = repository.get_job(&job_id).await? else {
        return Ok(());
    };
    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.status == JobStatus::Complete && outcome.is_sponsored {
        println!(
            "{} sponsored after OCR at {} (p={:.2})",
            success(),
            outcome.current_position.as_str(),
            outcome.probability
        );
        print_indicators(&outcome.indicators);
    } else {
        println!(
            "{} OCR finished at {}: not sponsored",
            info(),
            outcome.current_position.as_str()
        );
    }
    Ok(())
}
