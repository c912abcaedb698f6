use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adjudication::{TokenUsage, UnresolvedReason};
use crate::candidates::Candidate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
/// Final answer for one title. Only `Classified` names a leaf.
pub enum ClassificationOutcome {
    Classified { leaf: Candidate, rank: usize },
    NoCandidates,
    Unresolved { reason: UnresolvedReason },
}

impl ClassificationOutcome {
    pub fn is_classified(&self) -> bool {
        matches!(self, ClassificationOutcome::Classified { .. })
    }

    pub fn leaf(&self) -> Option<&Candidate> {
        match self {
            ClassificationOutcome::Classified { leaf, .. } => Some(leaf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedTitle {
    pub id: String,
    pub original: String,
    pub normalized: String,
    pub outcome: ClassificationOutcome,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    pub retrieval_ms: u64,
    pub llm_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Run-level figures: also the benchmark report.
pub struct RunSummary {
    pub count: usize,
    pub timings: Timings,
    pub tokens: TokenUsage,
    /// Adjudicated items by chosen rank; `0` counts items that ended unresolved.
    pub rank_counts: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BatchReport {
    #[serde(flatten)]
    pub summary: RunSummary,
    pub items: Vec<ClassifiedTitle>,
}
