//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric setting could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    IntegerParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Numeric setting was zero where a positive count is required.
    #[error("invalid {name}='{value}': must be greater than zero")]
    MustBePositive { name: &'static str, value: String },

    /// A required setting was present but blank.
    #[error("{name} must not be empty")]
    EmptyValue { name: &'static str },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },
}
