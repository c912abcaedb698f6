//! Closed-world adjudication of candidate shortlists by a generative model.
//!
//! - [`generator`] is the structured-output boundary (genai-backed, or mocked).
//! - [`prompt`] builds the per-batch instructions, payload and response schema.
//! - [`adjudicator`] runs batches through a bounded worker pool with retries.
//! - [`validation`] rejects answers that are not among the offered candidates.

pub mod adjudicator;
pub mod config;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

pub use adjudicator::Adjudicator;
pub use config::AdjudicatorConfig;
pub use error::{AdjudicationError, AdjudicationResult};
#[cfg(any(test, feature = "mock"))]
pub use generator::{MockBehavior, MockStructuredGenerator};
pub use generator::{GenaiGenerator, StructuredGenerator, StructuredRequest, StructuredResponse};
pub use types::{
    AdjudicatedItem, AdjudicationInputItem, AdjudicationReport, PromptCandidate, PromptItem,
    PromptPayload, ResponseEnvelope, ResponseRow, TokenUsage, UnresolvedReason, Verdict,
};
pub use validation::{match_rank, validate_batch};
