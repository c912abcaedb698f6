//! Cross-cutting, shared constants.
//!
//! Retrieval and adjudication defaults live here so the candidate generator, the
//! adjudicator and the binary agree on the same numbers. Runtime overrides go through
//! [`crate::config::Config`] and the per-module option structs.

use std::time::Duration;

/// Weight of the normalized cosine score in the fused score.
pub const DEFAULT_EMBEDDING_WEIGHT: f32 = 0.65;
/// Weight of the normalized BM25 score in the fused score.
pub const DEFAULT_LEXICAL_WEIGHT: f32 = 0.35;
/// Number of fused candidates handed to the adjudicator per title.
pub const DEFAULT_TOP_K: usize = 5;
/// Size of the lexical pool that gets cosine-rescored.
pub const DEFAULT_TOP_N_COSINE: usize = 200;

/// BM25 term-frequency saturation.
pub const BM25_K1: f32 = 1.5;
/// BM25 length normalization.
pub const BM25_B: f32 = 0.75;

/// Items per adjudication call.
pub const DEFAULT_BATCH_SIZE: usize = 25;
/// Max in-flight outbound calls per fan-out stage.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Extra attempts for a failed adjudication batch.
pub const DEFAULT_BATCH_RETRIES: usize = 2;
/// Base delay between adjudication retries (doubles per attempt).
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(750);
/// Timeout for one adjudication call.
pub const DEFAULT_ADJUDICATION_TIMEOUT: Duration = Duration::from_secs(90);
/// Default generative model used for adjudication.
pub const DEFAULT_ADJUDICATION_MODEL: &str = "gemini-2.5-flash";

/// Query-embedding cache capacity.
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: usize = 1000;
/// Query-embedding cache entry lifetime.
pub const DEFAULT_EMBEDDING_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
/// Timeout for one embedding request.
pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(20);
/// Leaves per request when regenerating the leaf-embeddings artifact.
pub const DEFAULT_LEAF_EMBEDDING_BATCH: usize = 100;
/// Primary embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Ordered fallback embedding models.
pub const DEFAULT_EMBEDDING_FALLBACKS: &[&str] =
    &["text-embedding-3-large", "text-embedding-ada-002"];

/// Fused-candidate cache capacity.
pub const DEFAULT_CANDIDATE_CACHE_CAPACITY: u64 = 2000;
/// Fused-candidate cache entry lifetime.
pub const DEFAULT_CANDIDATE_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Max titles accepted by one classification call.
pub const DEFAULT_MAX_ITEMS: usize = 500;

/// Separator used when composing a leaf's `full_path`.
pub const PATH_SEPARATOR: &str = " › ";
