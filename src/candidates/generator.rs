use std::sync::Arc;

use tracing::debug;

use super::cache::CandidateCache;
use super::fusion::fuse;
use super::types::{Candidate, CandidateOptions, ScoredLeaf};
use crate::embedding::EmbeddingStore;
use crate::lexical::Bm25Index;
use crate::taxonomy::Taxonomy;

/// Lexical pool → cosine rescoring → per-request min-max fusion → top K.
pub struct CandidateGenerator {
    taxonomy: Arc<Taxonomy>,
    lexical: Arc<Bm25Index>,
    embeddings: Arc<EmbeddingStore>,
    options: CandidateOptions,
    cache: CandidateCache,
}

impl CandidateGenerator {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        lexical: Arc<Bm25Index>,
        embeddings: Arc<EmbeddingStore>,
        options: CandidateOptions,
    ) -> Self {
        Self {
            taxonomy,
            lexical,
            embeddings,
            options,
            cache: CandidateCache::new(),
        }
    }

    pub fn with_cache(mut self, cache: CandidateCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn options(&self) -> &CandidateOptions {
        &self.options
    }

    pub fn cache(&self) -> &CandidateCache {
        &self.cache
    }

    pub fn embeddings(&self) -> &EmbeddingStore {
        &self.embeddings
    }

    /// Shortlist for one normalized title. An empty list means "no candidates".
    ///
    /// The query is only embedded when the lexical pool is non-empty and leaf vectors are
    /// loaded.
    pub async fn get_candidates(&self, normalized: &str) -> Arc<Vec<Candidate>> {
        if let Some(hit) = self.cache.get(normalized) {
            return hit;
        }

        if self.lexical.search(normalized, 1).is_empty() {
            let empty = Arc::new(Vec::new());
            self.cache.insert(normalized, Arc::clone(&empty));
            return empty;
        }

        let query: Arc<[f32]> = if self.embeddings.is_absent() {
            Arc::from(Vec::new())
        } else {
            self.embeddings.embed_query(normalized).await
        };
        let candidates = Arc::new(self.score(normalized, &query));

        // Lexical-only scores from a failed query embedding are not cached.
        if query.is_empty() && !self.embeddings.is_absent() {
            debug!(normalized, "Query embedding unavailable; shortlist not cached");
        } else {
            self.cache.insert(normalized, Arc::clone(&candidates));
        }
        candidates
    }

    /// Synchronous scoring against an already-computed query vector.
    pub fn score(&self, normalized: &str, query: &[f32]) -> Vec<Candidate> {
        let hits = self.lexical.search(normalized, self.options.top_n_cosine);
        let pool: Vec<ScoredLeaf<'_>> = hits
            .iter()
            .filter_map(|hit| {
                let leaf = self.taxonomy.leaf(&hit.leaf_key)?;
                Some(ScoredLeaf {
                    leaf,
                    lexical: hit.score,
                    cosine: self.embeddings.cosine_to_leaf(query, &hit.leaf_key),
                })
            })
            .collect();

        let candidates = fuse(&pool, &self.options);
        debug!(
            pool = pool.len(),
            returned = candidates.len(),
            top = candidates.first().map(|c| c.leaf_key.as_str()).unwrap_or(""),
            "Candidates fused"
        );
        candidates
    }
}
