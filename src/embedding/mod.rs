//! Embedding store: precomputed leaf vectors plus cached query embedding.
//!
//! - [`provider`] abstracts the external embedding service.
//! - [`cache`] is the query-embedding LRU+TTL arena.
//! - [`store`] loads the leaf artifact and embeds queries with model fallback.
//! - [`builder`] regenerates the leaf artifact offline.

pub mod builder;
pub mod cache;
pub mod config;
mod error;
pub mod provider;
pub mod similarity;
pub mod store;

#[cfg(test)]
mod tests;

pub use builder::LeafEmbeddingBuilder;
#[cfg(any(test, feature = "mock"))]
pub use cache::ManualClock;
pub use cache::{Clock, LruArena, QueryEmbeddingCache, SystemClock};
pub use config::EmbeddingConfig;
pub use error::{EmbeddingError, EmbeddingResult};
#[cfg(any(test, feature = "mock"))]
pub use provider::MockEmbeddingProvider;
pub use provider::{EmbeddingProvider, HttpEmbeddingProvider};
pub use similarity::cosine_similarity;
pub use store::{
    EmbeddingStore, LeafEmbeddings, LeafEmbeddingsArtifact, LeafLabels, LeafVectorRecord,
    embed_with_fallback, load_leaf_embeddings,
};
