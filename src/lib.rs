//! Taxoclass library crate (used by the binary and integration tests).
//!
//! Classifies free-text retail product titles into the leaves (sous-familles) of a
//! four-level retail taxonomy.
//!
//! # Pipeline
//!
//! 1. [`normalize`] folds a raw title into a canonical string.
//! 2. [`lexical`] scores every leaf with BM25 over its label tokens.
//! 3. [`embedding`] rescoring: cosine between the query and precomputed leaf vectors.
//! 4. [`candidates`] fuses both signals into a top-K shortlist.
//! 5. [`adjudication`] asks a generative model to pick one leaf from the shortlist, and
//!    rejects any answer outside it.
//!
//! [`pipeline::Classifier`] wires the stages and reports per-title outcomes.
//!
//! ## Test/Mock Support
//! Mock providers are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod adjudication;
pub mod candidates;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod hashing;
pub mod lexical;
pub mod normalize;
pub mod pipeline;
pub mod taxonomy;

pub use adjudication::{
    AdjudicatedItem, AdjudicationError, AdjudicationInputItem, AdjudicationReport, Adjudicator,
    AdjudicatorConfig, GenaiGenerator, StructuredGenerator, TokenUsage, UnresolvedReason, Verdict,
};
#[cfg(any(test, feature = "mock"))]
pub use adjudication::{MockBehavior, MockStructuredGenerator};
pub use candidates::{Candidate, CandidateGenerator, CandidateOptions, CandidateScores};
pub use config::{Config, ConfigError};
pub use embedding::{
    EmbeddingConfig, EmbeddingError, EmbeddingProvider, EmbeddingStore, HttpEmbeddingProvider,
    LeafEmbeddingBuilder, LeafEmbeddingsArtifact, cosine_similarity, load_leaf_embeddings,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingProvider;
pub use hashing::{hash_taxonomy_structure, hash_title};
pub use lexical::{Bm25Index, LexicalHit};
pub use normalize::{NormalizedTitle, normalize};
pub use pipeline::{
    BatchReport, ClassificationOutcome, ClassifiedTitle, Classifier, PipelineError, RunSummary,
    run_benchmark, sample_titles,
};
pub use taxonomy::{Leaf, NodeLabel, Taxonomy, TaxonomyError, TaxonomyRepository};
#[cfg(any(test, feature = "mock"))]
pub use taxonomy::{FIXTURE_HIERARCHY, fixture_taxonomy};
