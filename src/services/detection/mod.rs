//! Sponsorship detection for search hits.

mod batch;
mod evaluator;
#[cfg(test)]
pub(crate) mod fakes;

pub use batch::{evaluate_batch, BatchOutcome};
pub use evaluator::{PostEvaluator, CANCELLED};
