use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EMBEDDING_WEIGHT, DEFAULT_LEXICAL_WEIGHT, DEFAULT_TOP_K, DEFAULT_TOP_N_COSINE,
};
use crate::taxonomy::{Leaf, NodeLabel};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Fusion weights and pool sizes.
pub struct CandidateOptions {
    pub embedding_weight: f32,
    pub lexical_weight: f32,
    /// Candidates returned per title.
    pub top_k: usize,
    /// Lexical hits rescored with cosine.
    pub top_n_cosine: usize,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            embedding_weight: DEFAULT_EMBEDDING_WEIGHT,
            lexical_weight: DEFAULT_LEXICAL_WEIGHT,
            top_k: DEFAULT_TOP_K,
            top_n_cosine: DEFAULT_TOP_N_COSINE,
        }
    }
}

impl CandidateOptions {
    pub fn with_weights(mut self, embedding: f32, lexical: f32) -> Self {
        self.embedding_weight = embedding;
        self.lexical_weight = lexical;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_top_n_cosine(mut self, top_n: usize) -> Self {
        self.top_n_cosine = top_n;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
/// Per-request normalized scores, each in `[0, 1]`.
pub struct CandidateScores {
    pub lexical: f32,
    pub cosine: f32,
    pub fused: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One shortlisted leaf for one title.
pub struct Candidate {
    pub leaf_key: String,
    pub sector: NodeLabel,
    pub rayon: NodeLabel,
    pub famille: NodeLabel,
    pub sous_famille: NodeLabel,
    pub full_path: String,
    pub scores: CandidateScores,
}

impl Candidate {
    pub fn from_leaf(leaf: &Leaf, scores: CandidateScores) -> Self {
        Self {
            leaf_key: leaf.leaf_key.clone(),
            sector: leaf.sector.clone(),
            rayon: leaf.rayon.clone(),
            famille: leaf.famille.clone(),
            sous_famille: leaf.sous_famille.clone(),
            full_path: leaf.full_path.clone(),
            scores,
        }
    }
}

/// Raw, un-normalized scores of one pool member.
#[derive(Debug, Clone, Copy)]
pub struct ScoredLeaf<'a> {
    pub leaf: &'a Leaf,
    pub lexical: f32,
    pub cosine: f32,
}
