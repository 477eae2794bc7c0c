//! Search and evaluate: one upstream page, one verdict per hit.

mod client;
mod query;

pub use client::{
    NaverCredentials, NaverSearchClient, SearchApi, SearchError, SearchPage, DEFAULT_SEARCH_URL,
};
pub use query::{SearchQuery, SearchResponse, DEFAULT_LIMIT, MAX_LIMIT, MAX_OFFSET};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::detection::{evaluate_batch, PostEvaluator};

pub struct SearchService {
    api: Arc<dyn SearchApi>,
    evaluator: Arc<PostEvaluator>,
}

impl SearchService {
    pub fn new(api: Arc<dyn SearchApi>, evaluator: Arc<PostEvaluator>) -> Self {
        Self { api, evaluator }
    }

    /// Fetch one page of hits and evaluate all of them.
    ///
    /// Only upstream failures are errors; per-post problems are recorded on
    /// the individual verdicts.
    pub async fn search(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, SearchError> {
        let keyword = query.query.trim();
        let start = query.offset().min(MAX_OFFSET) + 1;
        let page = self
            .api
            .search_blog(keyword, query.limit(), start, cancel)
            .await?;
        info!(
            "Search '{}' returned {} of {} hits",
            keyword,
            page.items.len(),
            page.total
        );

        let outcome = evaluate_batch(self.evaluator.clone(), page.items, page.total, cancel).await;
        Ok(SearchResponse::from_outcome(query, outcome))
    }
}
