//! Service layer for sponsorlens business logic.
//!
//! Services hold the detection pipeline independent of how it is driven.
//! The HTTP server and the CLI both build on them.

pub mod detection;
pub mod ocr;
pub mod queue;
pub mod search;

pub use detection::{evaluate_batch, BatchOutcome, PostEvaluator};
pub use ocr::{ImageOcrService, ImageTextExtractor, OcrCache, OcrSettings};
pub use queue::{ChannelQueue, OcrDispatcher, OcrQueue, OcrQueueWorker, QueueDispatcher, QueueError};
pub use search::{
    NaverCredentials, NaverSearchClient, SearchApi, SearchError, SearchQuery, SearchResponse,
    SearchService,
};
