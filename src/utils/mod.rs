//! Shared utility functions.
//!
//! - `html`: tag stripping for search API snippets
//! - `date`: post date era checks
//! - `cancel`: deadlines and cancellation for external calls

pub mod cancel;
pub mod date;
pub mod html;

pub use html::strip_tags;
