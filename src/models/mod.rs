//! Data models for sponsorlens.

mod crawl;
pub mod indicator;
mod ocr;
mod post;

pub use crawl::CrawlSnapshot;
pub use indicator::{Indicator, IndicatorSource, IndicatorType, PatternType, SourceTag};
pub use ocr::{JobStatus, JobVerdict, OcrJob, OcrResult, Position};
pub use post::{PostVerdict, SearchHit};
