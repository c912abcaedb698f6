use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::candidates::{Candidate, CandidateScores};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One title with its shortlist.
pub struct AdjudicationInputItem {
    pub id: String,
    pub title_normalized: String,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input += rhs.input;
        self.output += rhs.output;
        self.total += rhs.total;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Why an item could not be adjudicated.
pub enum UnresolvedReason {
    /// The item had an empty shortlist and was never sent.
    NoCandidates,
    /// Every attempt for the item's batch failed.
    ProviderFailed { error: String },
    /// The response carried no row for this id.
    MissingFromResponse,
    /// The chosen leaf was not one of the supplied candidates.
    NotAmongCandidates {
        sous_famille_code: String,
        full_path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// `rank` is the 1-based position of `candidate` in the shortlist.
    Chosen {
        candidate: Candidate,
        rank: usize,
    },
    Unresolved {
        reason: UnresolvedReason,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicatedItem {
    pub id: String,
    pub verdict: Verdict,
}

impl AdjudicatedItem {
    pub fn chosen(id: impl Into<String>, candidate: Candidate, rank: usize) -> Self {
        Self {
            id: id.into(),
            verdict: Verdict::Chosen { candidate, rank },
        }
    }

    pub fn unresolved(id: impl Into<String>, reason: UnresolvedReason) -> Self {
        Self {
            id: id.into(),
            verdict: Verdict::Unresolved { reason },
        }
    }

    /// 1-based rank of the chosen candidate; `0` when unresolved.
    pub fn rank(&self) -> usize {
        match &self.verdict {
            Verdict::Chosen { rank, .. } => *rank,
            Verdict::Unresolved { .. } => 0,
        }
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match &self.verdict {
            Verdict::Chosen { candidate, .. } => Some(candidate),
            Verdict::Unresolved { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Results in input order plus accumulated token usage.
pub struct AdjudicationReport {
    pub results: Vec<AdjudicatedItem>,
    pub usage: TokenUsage,
    /// Provider calls made, retries included.
    pub calls: usize,
}

/// Candidate as serialized into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptCandidate {
    pub rank: usize,
    pub sector_code: String,
    pub sector_name: String,
    pub rayon_code: String,
    pub rayon_name: String,
    pub famille_code: String,
    pub famille_name: String,
    pub sous_famille_code: String,
    pub sous_famille_name: String,
    pub full_path: String,
    pub scores: CandidateScores,
}

impl PromptCandidate {
    pub fn from_candidate(rank: usize, c: &Candidate) -> Self {
        Self {
            rank,
            sector_code: c.sector.code.clone(),
            sector_name: c.sector.name.clone(),
            rayon_code: c.rayon.code.clone(),
            rayon_name: c.rayon.name.clone(),
            famille_code: c.famille.code.clone(),
            famille_name: c.famille.name.clone(),
            sous_famille_code: c.sous_famille.code.clone(),
            sous_famille_name: c.sous_famille.name.clone(),
            full_path: c.full_path.clone(),
            scores: c.scores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptItem {
    pub id: String,
    pub title: String,
    pub candidates: Vec<PromptCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// JSON document sent per batch.
pub struct PromptPayload {
    pub items: Vec<PromptItem>,
}

/// One row of the model's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRow {
    pub id: String,
    pub sector_code: String,
    pub sector_name: String,
    pub rayon_code: String,
    pub rayon_name: String,
    pub famille_code: String,
    pub famille_name: String,
    pub sous_famille_code: String,
    pub sous_famille_name: String,
    pub full_path: String,
    pub source_scores: CandidateScores,
}

impl ResponseRow {
    pub fn choosing(id: impl Into<String>, c: &PromptCandidate) -> Self {
        Self {
            id: id.into(),
            sector_code: c.sector_code.clone(),
            sector_name: c.sector_name.clone(),
            rayon_code: c.rayon_code.clone(),
            rayon_name: c.rayon_name.clone(),
            famille_code: c.famille_code.clone(),
            famille_name: c.famille_name.clone(),
            sous_famille_code: c.sous_famille_code.clone(),
            sous_famille_name: c.sous_famille_name.clone(),
            full_path: c.full_path.clone(),
            source_scores: c.scores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub results: Vec<ResponseRow>,
}
