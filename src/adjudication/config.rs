use std::time::Duration;

use crate::config::Config;
use crate::constants::{
    DEFAULT_ADJUDICATION_MODEL, DEFAULT_ADJUDICATION_TIMEOUT, DEFAULT_BATCH_RETRIES,
    DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_RETRY_BACKOFF,
};

#[derive(Debug, Clone)]
/// Configuration for [`Adjudicator`](super::Adjudicator).
pub struct AdjudicatorConfig {
    /// Generative model name, routed by genai.
    pub model: String,
    /// Items per call.
    pub batch_size: usize,
    /// Max in-flight calls.
    pub concurrency: usize,
    /// Extra attempts per batch after the first failure.
    pub retries: usize,
    /// Delay before the first retry; doubles per attempt.
    pub retry_backoff: Duration,
    /// Timeout for one call.
    pub timeout: Duration,
}

impl Default for AdjudicatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_ADJUDICATION_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            retries: DEFAULT_BATCH_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            timeout: DEFAULT_ADJUDICATION_TIMEOUT,
        }
    }
}

impl AdjudicatorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.adjudication_model.clone(),
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retries(mut self, retries: usize, backoff: Duration) -> Self {
        self.retries = retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
