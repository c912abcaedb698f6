use thiserror::Error;

use crate::config::ConfigError;
use crate::taxonomy::TaxonomyError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
