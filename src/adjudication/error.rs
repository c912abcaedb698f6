use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdjudicationError {
    #[error("generative provider failed for model {model}: {reason}")]
    Provider { model: String, reason: String },

    #[error("adjudication call timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("invalid adjudication response: {reason}")]
    InvalidResponse { reason: String },

    #[error("adjudication serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AdjudicationResult<T> = Result<T, AdjudicationError>;
