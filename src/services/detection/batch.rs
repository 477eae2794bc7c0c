//! Concurrent evaluation of a page of search hits.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::PostEvaluator;
use crate::models::{PostVerdict, SearchHit};

/// Verdicts for one page of hits, in hit order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub posts: Vec<PostVerdict>,
    /// The upstream total, not the page size.
    pub total_results: u64,
    pub sponsored_results: usize,
}

/// Evaluate every hit on its own task.
///
/// All tasks share `cancel` through child tokens. A panicking task becomes a
/// verdict with `error` set; the rest of the batch is unaffected.
pub async fn evaluate_batch(
    evaluator: Arc<PostEvaluator>,
    hits: Vec<SearchHit>,
    total_results: u64,
    cancel: &CancellationToken,
) -> BatchOutcome {
    let handles: Vec<_> = hits
        .iter()
        .cloned()
        .map(|hit| {
            let evaluator = evaluator.clone();
            let cancel = cancel.child_token();
            tokio::spawn(async move { evaluator.evaluate(hit, &cancel).await })
        })
        .collect();

    let posts: Vec<PostVerdict> = join_all(handles)
        .await
        .into_iter()
        .zip(hits)
        .map(|(joined, hit)| match joined {
            Ok(verdict) => verdict,
            Err(e) => {
                error!("Evaluation task for {} failed: {}", hit.link, e);
                PostVerdict::failed(hit, format!("internal error: {}", e))
            }
        })
        .collect();

    let sponsored_results = posts.iter().filter(|p| p.is_sponsored).count();
    info!(
        "Evaluated {} posts: {} sponsored, {} pending",
        posts.len(),
        sponsored_results,
        posts.iter().filter(|p| p.is_pending()).count()
    );

    BatchOutcome {
        posts,
        total_results,
        sponsored_results,
    }
}
