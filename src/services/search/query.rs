//! Search request parameters and response body.

use serde::{Deserialize, Serialize};

use crate::models::PostVerdict;
use crate::services::detection::BatchOutcome;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;
/// The upstream API accepts `start` up to 1000.
pub const MAX_OFFSET: u32 = 999;
const MIN_QUERY_CHARS: usize = 2;
const MAX_QUERY_CHARS: usize = 100;

/// `GET /search` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, limit: u32, offset: u32) -> Self {
        Self {
            query: query.into(),
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Check bounds. The message is returned to the client as-is.
    pub fn validate(&self) -> Result<(), String> {
        let chars = self.query.trim().chars().count();
        if chars == 0 {
            return Err("query is required".to_string());
        }
        if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&chars) {
            return Err(format!(
                "query must be between {} and {} characters",
                MIN_QUERY_CHARS, MAX_QUERY_CHARS
            ));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit()) {
            return Err(format!("limit must be between 1 and {}", MAX_LIMIT));
        }
        if self.offset() > MAX_OFFSET {
            return Err(format!("offset must be between 0 and {}", MAX_OFFSET));
        }
        Ok(())
    }
}

/// `GET /search` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub keyword: String,
    pub total_results: u64,
    pub sponsored_results: usize,
    pub page: u32,
    pub items_per_page: u32,
    pub posts: Vec<PostVerdict>,
}

impl SearchResponse {
    pub fn from_outcome(query: &SearchQuery, outcome: BatchOutcome) -> Self {
        let limit = query.limit().max(1);
        Self {
            keyword: query.query.trim().to_string(),
            total_results: outcome.total_results,
            sponsored_results: outcome.sponsored_results,
            page: query.offset() / limit + 1,
            items_per_page: limit,
            posts: outcome.posts,
        }
    }
}
