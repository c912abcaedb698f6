use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use super::config::EmbeddingConfig;
use super::error::{EmbeddingError, EmbeddingResult};
use super::provider::EmbeddingProvider;
use super::store::{LeafEmbeddingsArtifact, LeafLabels, LeafVectorRecord, embed_with_fallback};
use crate::taxonomy::Taxonomy;

/// Regenerates the leaf-embeddings artifact from a taxonomy snapshot.
///
/// Every leaf's `full_path` is embedded in fixed-size batches. The first batch walks the
/// model chain; once a model succeeds, later batches are pinned to it so the artifact
/// never mixes vector spaces.
pub struct LeafEmbeddingBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    models: Vec<String>,
    batch_size: usize,
    timeout: Duration,
}

impl LeafEmbeddingBuilder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            models: config.models.clone(),
            batch_size: config.batch_size.max(1),
            timeout: config.timeout,
        }
    }

    pub async fn build(&self, taxonomy: &Taxonomy) -> EmbeddingResult<LeafEmbeddingsArtifact> {
        let leaves = taxonomy.leaves();
        let mut chain = self.models.clone();
        let mut records = Vec::with_capacity(leaves.len());
        let mut dim: Option<usize> = None;

        for (batch_idx, batch) in leaves.chunks(self.batch_size).enumerate() {
            let inputs: Vec<String> = batch.iter().map(|l| l.full_path.clone()).collect();
            let (model, vectors) =
                embed_with_fallback(self.provider.as_ref(), &chain, &inputs, self.timeout).await?;

            if vectors.len() != batch.len() {
                return Err(EmbeddingError::InvalidResponse {
                    model,
                    reason: format!("{} vectors for {} leaves", vectors.len(), batch.len()),
                });
            }

            for (leaf, vector) in batch.iter().zip(vectors) {
                let expected = *dim.get_or_insert(vector.len());
                if vector.len() != expected || expected == 0 {
                    return Err(EmbeddingError::InvalidResponse {
                        model,
                        reason: format!(
                            "leaf {} has dimension {}, expected {}",
                            leaf.leaf_key,
                            vector.len(),
                            expected
                        ),
                    });
                }
                records.push(LeafVectorRecord {
                    leaf_id: leaf.leaf_id.clone(),
                    leaf_key: leaf.leaf_key.clone(),
                    full_path: leaf.full_path.clone(),
                    labels: LeafLabels {
                        sector: leaf.sector.name.clone(),
                        rayon: leaf.rayon.name.clone(),
                        famille: leaf.famille.name.clone(),
                        sous_famille: leaf.sous_famille.name.clone(),
                    },
                    vector,
                });
            }

            info!(
                batch = batch_idx + 1,
                embedded = records.len(),
                total = leaves.len(),
                model = %model,
                "Leaf embedding batch done"
            );
            chain = vec![model];
        }

        let model = chain.into_iter().next().unwrap_or_default();
        Ok(LeafEmbeddingsArtifact {
            model,
            dim: dim.unwrap_or(0),
            taxonomy_hash: taxonomy.hash().to_string(),
            created_at: Utc::now().to_rfc3339(),
            vectors: records,
        })
    }
}
