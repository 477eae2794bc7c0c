//! HTTP request handlers for the web server.

mod api;
mod jobs;
mod search;

pub use api::health;
pub use jobs::{job_results, job_status};
pub use search::search;
