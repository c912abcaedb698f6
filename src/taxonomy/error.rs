use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("hierarchy source not found at path: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hierarchy source {path} contains no leaves")]
    NoLeaves { path: PathBuf },

    #[error("failed to serialize taxonomy snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("taxonomy invariant violated: {reason}")]
    InvariantViolation { reason: String },
}

pub type TaxonomyResult<T> = Result<T, TaxonomyError>;
