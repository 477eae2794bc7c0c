//! Fetching and parsing remote blog content.

pub mod blog;
pub mod http_client;

pub use blog::{BlogCrawler, CrawlError, WebBlogCrawler};
pub use http_client::{FetchError, HttpClient, RetryPolicy};
