use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::cache::QueryEmbeddingCache;
use super::config::EmbeddingConfig;
use super::error::{EmbeddingError, EmbeddingResult};
use super::provider::EmbeddingProvider;
use super::similarity::cosine_similarity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafLabels {
    pub sector: String,
    pub rayon: String,
    pub famille: String,
    pub sous_famille: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafVectorRecord {
    pub leaf_id: String,
    pub leaf_key: String,
    pub full_path: String,
    pub labels: LeafLabels,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// On-disk leaf-embeddings artifact.
pub struct LeafEmbeddingsArtifact {
    pub model: String,
    pub dim: usize,
    pub taxonomy_hash: String,
    /// RFC 3339.
    pub created_at: String,
    pub vectors: Vec<LeafVectorRecord>,
}

impl LeafEmbeddingsArtifact {
    pub fn read(path: &Path) -> EmbeddingResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| EmbeddingError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn write(&self, path: &Path) -> EmbeddingResult<()> {
        let io_err = |e| EmbeddingError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

/// Leaf vectors keyed by `leaf_key`.
#[derive(Debug, Clone)]
pub struct LeafEmbeddings {
    pub model: String,
    pub dim: usize,
    pub taxonomy_hash: String,
    vectors: HashMap<String, Vec<f32>>,
}

impl LeafEmbeddings {
    pub fn from_artifact(artifact: LeafEmbeddingsArtifact) -> Self {
        let vectors = artifact
            .vectors
            .into_iter()
            .map(|r| (r.leaf_key, r.vector))
            .collect();
        Self {
            model: artifact.model,
            dim: artifact.dim,
            taxonomy_hash: artifact.taxonomy_hash,
            vectors,
        }
    }

    pub fn get(&self, leaf_key: &str) -> Option<&[f32]> {
        self.vectors.get(leaf_key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Loads the artifact at `path`, or `None` when it is missing, unreadable or empty.
///
/// A `taxonomy_hash` that differs from the live taxonomy only logs a warning.
pub fn load_leaf_embeddings(path: &Path, taxonomy_hash: &str) -> Option<LeafEmbeddings> {
    if !path.exists() {
        warn!(path = %path.display(), "Leaf embeddings missing; cosine scores disabled");
        return None;
    }

    let artifact = match LeafEmbeddingsArtifact::read(path) {
        Ok(a) => a,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Leaf embeddings unreadable; cosine scores disabled");
            return None;
        }
    };

    if artifact.vectors.is_empty() {
        warn!(path = %path.display(), "Leaf embeddings empty; cosine scores disabled");
        return None;
    }

    if artifact.taxonomy_hash != taxonomy_hash {
        warn!(
            path = %path.display(),
            artifact_hash = %artifact.taxonomy_hash,
            taxonomy_hash = %taxonomy_hash,
            "Leaf embeddings were built for a different taxonomy; using them anyway"
        );
    }

    let embeddings = LeafEmbeddings::from_artifact(artifact);
    info!(
        path = %path.display(),
        model = %embeddings.model,
        dim = embeddings.dim,
        leaves = embeddings.len(),
        "Leaf embeddings loaded"
    );
    Some(embeddings)
}

/// Tries each model in order until one succeeds. Returns the winning model and its vectors.
pub async fn embed_with_fallback(
    provider: &dyn EmbeddingProvider,
    models: &[String],
    inputs: &[String],
    timeout: Duration,
) -> EmbeddingResult<(String, Vec<Vec<f32>>)> {
    for (attempt, model) in models.iter().enumerate() {
        let result = match tokio::time::timeout(timeout, provider.embed(model, inputs)).await {
            Ok(res) => res,
            Err(_) => Err(EmbeddingError::Timeout {
                model: model.clone(),
                timeout,
            }),
        };

        match result {
            Ok(vectors) => {
                if attempt > 0 {
                    info!(model = %model, attempt, "Embedding served by fallback model");
                }
                return Ok((model.clone(), vectors));
            }
            Err(e) => warn!(model = %model, error = %e, "Embedding model failed"),
        }
    }

    Err(EmbeddingError::AllModelsFailed {
        models: models.to_vec(),
    })
}

/// Leaf vectors plus cached on-demand query embedding.
pub struct EmbeddingStore {
    provider: Arc<dyn EmbeddingProvider>,
    models: Vec<String>,
    timeout: Duration,
    cache: QueryEmbeddingCache,
    leaves: Option<LeafEmbeddings>,
}

impl EmbeddingStore {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        config: &EmbeddingConfig,
        leaves: Option<LeafEmbeddings>,
    ) -> Self {
        Self::with_cache(
            provider,
            config,
            leaves,
            QueryEmbeddingCache::new(config.cache_capacity, config.cache_ttl),
        )
    }

    pub fn with_cache(
        provider: Arc<dyn EmbeddingProvider>,
        config: &EmbeddingConfig,
        leaves: Option<LeafEmbeddings>,
        cache: QueryEmbeddingCache,
    ) -> Self {
        Self {
            provider,
            models: config.models.clone(),
            timeout: config.timeout,
            cache,
            leaves,
        }
    }

    /// `true` when no leaf vectors are loaded; every cosine is then `0.0`.
    pub fn is_absent(&self) -> bool {
        self.leaves.is_none()
    }

    pub fn leaves(&self) -> Option<&LeafEmbeddings> {
        self.leaves.as_ref()
    }

    pub fn cache(&self) -> &QueryEmbeddingCache {
        &self.cache
    }

    /// Embeds a normalized title. Never fails: exhausting every model yields an empty vector,
    /// which is not cached.
    #[instrument(skip(self), fields(cached = tracing::field::Empty))]
    pub async fn embed_query(&self, normalized: &str) -> Arc<[f32]> {
        if normalized.is_empty() {
            return Arc::from(Vec::new());
        }

        if let Some(hit) = self.cache.get(normalized) {
            tracing::Span::current().record("cached", true);
            return hit;
        }
        tracing::Span::current().record("cached", false);

        let inputs = [normalized.to_string()];
        match embed_with_fallback(self.provider.as_ref(), &self.models, &inputs, self.timeout).await
        {
            Ok((_, mut vectors)) if !vectors.is_empty() => {
                let vector: Arc<[f32]> = Arc::from(vectors.swap_remove(0));
                self.cache.insert(normalized, Arc::clone(&vector));
                vector
            }
            Ok(_) => {
                warn!("Embedding provider returned no vector");
                Arc::from(Vec::new())
            }
            Err(e) => {
                warn!(error = %e, "Query embedding failed; falling back to zero vector");
                Arc::from(Vec::new())
            }
        }
    }

    /// Cosine between a query vector and a leaf; `0.0` if either is unavailable.
    pub fn cosine_to_leaf(&self, query: &[f32], leaf_key: &str) -> f32 {
        let Some(leaves) = &self.leaves else {
            return 0.0;
        };
        match leaves.get(leaf_key) {
            Some(v) => cosine_similarity(query, v),
            None => {
                debug!(leaf_key, "No vector for leaf");
                0.0
            }
        }
    }
}
