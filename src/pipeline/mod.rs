//! End-to-end classification: normalize → retrieve (bounded fan-out) → adjudicate.
//!
//! Titles with an empty shortlist are reported as [`ClassificationOutcome::NoCandidates`]
//! and never reach the adjudicator; unresolved adjudications stay distinct from both.

pub mod bench;
pub mod classifier;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use bench::{DEFAULT_BENCH_SIZE, SAMPLE_TITLES, run_benchmark, sample_titles};
pub use classifier::Classifier;
pub use error::{PipelineError, PipelineResult};
pub use types::{BatchReport, ClassificationOutcome, ClassifiedTitle, RunSummary, Timings};
