use std::time::Duration;

use crate::config::{Config, DEFAULT_EMBEDDING_URL};
use crate::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_EMBEDDING_CACHE_CAPACITY, DEFAULT_EMBEDDING_CACHE_TTL,
    DEFAULT_EMBEDDING_FALLBACKS, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_TIMEOUT,
    DEFAULT_LEAF_EMBEDDING_BATCH,
};

#[derive(Debug, Clone)]
/// Configuration for the [`EmbeddingStore`](super::EmbeddingStore) and
/// [`LeafEmbeddingBuilder`](super::LeafEmbeddingBuilder).
pub struct EmbeddingConfig {
    /// OpenAI-compatible base URL (`/embeddings` is appended).
    pub base_url: String,
    /// Bearer key, if the endpoint needs one.
    pub api_key: Option<String>,
    /// Primary model first, then fallbacks in the order they are tried.
    pub models: Vec<String>,
    /// Timeout for one provider call.
    pub timeout: Duration,
    /// Query-embedding cache capacity.
    pub cache_capacity: usize,
    /// Query-embedding cache entry lifetime.
    pub cache_ttl: Duration,
    /// Leaves per request when building the artifact.
    pub batch_size: usize,
    /// Max in-flight query embeddings during a batch.
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let mut models = vec![DEFAULT_EMBEDDING_MODEL.to_string()];
        models.extend(DEFAULT_EMBEDDING_FALLBACKS.iter().map(|m| m.to_string()));
        Self {
            base_url: DEFAULT_EMBEDDING_URL.to_string(),
            api_key: None,
            models,
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
            cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
            cache_ttl: DEFAULT_EMBEDDING_CACHE_TTL,
            batch_size: DEFAULT_LEAF_EMBEDDING_BATCH,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl EmbeddingConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.embedding_url.clone(),
            api_key: config.embedding_api_key.clone(),
            models: config.embedding_model_chain(),
            concurrency: config.concurrency,
            ..Default::default()
        }
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
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
}
