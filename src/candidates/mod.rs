//! Candidate generation: BM25 pool, cosine rescoring and score fusion.

pub mod cache;
pub mod fusion;
pub mod generator;
pub mod types;


pub use cache::CandidateCache;
pub use fusion::fuse;
pub use generator::CandidateGenerator;
pub use types::{Candidate, CandidateOptions, CandidateScores, ScoredLeaf};
