use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::PipelineResult;
use super::types::{BatchReport, ClassificationOutcome, ClassifiedTitle, RunSummary, Timings};
use crate::adjudication::{
    AdjudicatedItem, AdjudicationInputItem, Adjudicator, AdjudicatorConfig, StructuredGenerator,
    UnresolvedReason, Verdict,
};
use crate::candidates::{Candidate, CandidateGenerator, CandidateOptions};
use crate::config::Config;
use crate::constants::{DEFAULT_CONCURRENCY, DEFAULT_MAX_ITEMS};
use crate::embedding::{EmbeddingConfig, EmbeddingProvider, EmbeddingStore, load_leaf_embeddings};
use crate::lexical::Bm25Index;
use crate::normalize::{NormalizedTitle, normalize};
use crate::taxonomy::{Taxonomy, TaxonomyRepository};

/// Titles in, one [`ClassificationOutcome`] per title out.
pub struct Classifier {
    candidates: CandidateGenerator,
    adjudicator: Adjudicator,
    max_items: usize,
    concurrency: usize,
}

impl Classifier {
    pub fn new(candidates: CandidateGenerator, adjudicator: Adjudicator) -> Self {
        Self {
            candidates,
            adjudicator,
            max_items: DEFAULT_MAX_ITEMS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Validates `config`, loads the taxonomy (snapshot first, then source) and wires
    /// every stage.
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn StructuredGenerator>,
    ) -> PipelineResult<Self> {
        config.validate()?;
        let repository =
            TaxonomyRepository::load(&config.hierarchy_path, &config.taxonomy_cache_path)?;
        Ok(Self::assemble(repository.taxonomy(), config, embedder, generator))
    }

    pub fn assemble(
        taxonomy: Arc<Taxonomy>,
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn StructuredGenerator>,
    ) -> Self {
        let lexical = Arc::new(Bm25Index::build(&taxonomy));
        let leaves = load_leaf_embeddings(&config.embeddings_path, taxonomy.hash());
        let store = Arc::new(EmbeddingStore::new(
            embedder,
            &EmbeddingConfig::from_config(config),
            leaves,
        ));
        let candidates =
            CandidateGenerator::new(taxonomy, lexical, store, CandidateOptions::default());
        let adjudicator = Adjudicator::new(generator, AdjudicatorConfig::from_config(config));

        Self::new(candidates, adjudicator)
            .with_max_items(config.max_items)
            .with_concurrency(config.concurrency)
    }

    pub fn candidates(&self) -> &CandidateGenerator {
        &self.candidates
    }

    /// Classifies up to `max_items` titles; extra titles are dropped with a warning.
    ///
    /// Item ids are 1-based positions in `titles`.
    #[instrument(skip_all, fields(titles = titles.len(), run_id = %Uuid::new_v4()))]
    pub async fn classify_batch<S: AsRef<str>>(&self, titles: &[S]) -> BatchReport {
        let started = Instant::now();
        if titles.len() > self.max_items {
            warn!(
                received = titles.len(),
                max_items = self.max_items,
                "Batch truncated"
            );
        }

        let normalized: Vec<NormalizedTitle> = titles
            .iter()
            .take(self.max_items)
            .map(|t| normalize(t.as_ref()))
            .collect();

        let retrieval_started = Instant::now();
        let shortlists: Vec<Arc<Vec<Candidate>>> = stream::iter(normalized.iter())
            .map(|title| self.candidates.get_candidates(&title.normalized))
            .buffered(self.concurrency)
            .collect()
            .await;
        let retrieval_ms = elapsed_ms(retrieval_started);

        let inputs: Vec<AdjudicationInputItem> = normalized
            .iter()
            .zip(&shortlists)
            .enumerate()
            .filter(|(_, (_, shortlist))| !shortlist.is_empty())
            .map(|(i, (title, shortlist))| AdjudicationInputItem {
                id: item_id(i),
                title_normalized: title.normalized.clone(),
                candidates: shortlist.as_ref().clone(),
            })
            .collect();

        let llm_started = Instant::now();
        let adjudication = self.adjudicator.adjudicate(&inputs).await;
        let llm_ms = elapsed_ms(llm_started);

        let mut verdicts: HashMap<String, AdjudicatedItem> = adjudication
            .results
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let mut summary = RunSummary {
            count: normalized.len(),
            tokens: adjudication.usage,
            ..Default::default()
        };

        let items: Vec<ClassifiedTitle> = normalized
            .into_iter()
            .zip(shortlists)
            .enumerate()
            .map(|(i, (title, shortlist))| {
                let id = item_id(i);
                let outcome = if shortlist.is_empty() {
                    ClassificationOutcome::NoCandidates
                } else {
                    let verdict = verdicts.remove(&id).map(|v| v.verdict).unwrap_or(
                        Verdict::Unresolved {
                            reason: UnresolvedReason::MissingFromResponse,
                        },
                    );
                    let outcome = match verdict {
                        Verdict::Chosen { candidate, rank } => ClassificationOutcome::Classified {
                            leaf: candidate,
                            rank,
                        },
                        Verdict::Unresolved { reason } => {
                            ClassificationOutcome::Unresolved { reason }
                        }
                    };
                    let rank = match &outcome {
                        ClassificationOutcome::Classified { rank, .. } => *rank,
                        _ => 0,
                    };
                    *summary.rank_counts.entry(rank).or_insert(0) += 1;
                    outcome
                };

                ClassifiedTitle {
                    id,
                    original: title.original,
                    normalized: title.normalized,
                    outcome,
                    candidates: shortlist.as_ref().clone(),
                }
            })
            .collect();

        summary.timings = Timings {
            retrieval_ms,
            llm_ms,
            total_ms: elapsed_ms(started),
        };

        let classified = items.iter().filter(|i| i.outcome.is_classified()).count();
        info!(
            count = summary.count,
            classified,
            no_candidates = items
                .iter()
                .filter(|i| i.outcome == ClassificationOutcome::NoCandidates)
                .count(),
            retrieval_ms,
            llm_ms,
            total_tokens = summary.tokens.total,
            "Batch classified"
        );

        BatchReport { summary, items }
    }

    /// Single-title convenience over [`Classifier::classify_batch`].
    pub async fn classify(&self, title: &str) -> Option<ClassifiedTitle> {
        self.classify_batch(&[title]).await.items.pop()
    }
}

fn item_id(index: usize) -> String {
    (index + 1).to_string()
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
