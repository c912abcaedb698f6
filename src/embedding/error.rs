use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request for model {model} failed: {reason}")]
    Request { model: String, reason: String },

    #[error("embedding provider returned {status} for model {model}: {body}")]
    Status {
        model: String,
        status: u16,
        body: String,
    },

    #[error("embedding request for model {model} timed out after {timeout:?}")]
    Timeout { model: String, timeout: Duration },

    #[error("invalid embedding response from model {model}: {reason}")]
    InvalidResponse { model: String, reason: String },

    #[error("all embedding models failed: {models:?}")]
    AllModelsFailed { models: Vec<String> },

    #[error("invalid embedding configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("embeddings artifact I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("embeddings artifact serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
