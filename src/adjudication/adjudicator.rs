use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::config::AdjudicatorConfig;
use super::error::{AdjudicationError, AdjudicationResult};
use super::generator::StructuredGenerator;
use super::prompt::build_request;
use super::types::{
    AdjudicatedItem, AdjudicationInputItem, AdjudicationReport, ResponseEnvelope, TokenUsage,
    UnresolvedReason,
};
use super::validation::validate_batch;

type IndexedItem<'a> = (usize, &'a AdjudicationInputItem);

struct BatchOutcome {
    results: Vec<(usize, AdjudicatedItem)>,
    usage: TokenUsage,
    calls: usize,
}

/// Batched, concurrency-capped closed-world adjudication.
pub struct Adjudicator {
    generator: Arc<dyn StructuredGenerator>,
    config: AdjudicatorConfig,
}

impl Adjudicator {
    pub fn new(generator: Arc<dyn StructuredGenerator>, config: AdjudicatorConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &AdjudicatorConfig {
        &self.config
    }

    /// Adjudicates every item; the report lists one verdict per item in input order.
    ///
    /// Items without candidates are not sent. `concurrency` workers claim batches from a
    /// shared cursor until none remain, and are all awaited before returning.
    #[instrument(skip_all, fields(items = items.len(), model = %self.config.model))]
    pub async fn adjudicate(&self, items: &[AdjudicationInputItem]) -> AdjudicationReport {
        let mut results: Vec<(usize, AdjudicatedItem)> = Vec::with_capacity(items.len());
        let mut ready: Vec<IndexedItem<'_>> = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if item.candidates.is_empty() {
                results.push((
                    idx,
                    AdjudicatedItem::unresolved(&item.id, UnresolvedReason::NoCandidates),
                ));
            } else {
                ready.push((idx, item));
            }
        }

        let batches: Vec<&[IndexedItem<'_>]> =
            ready.chunks(self.config.batch_size.max(1)).collect();
        let cursor = AtomicUsize::new(0);
        let workers = self.config.concurrency.max(1).min(batches.len());

        let outcomes = join_all((0..workers).map(|worker| {
            let cursor = &cursor;
            let batches = &batches;
            async move {
                let mut done = Vec::new();
                loop {
                    let next = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(batch) = batches.get(next) else {
                        break;
                    };
                    debug!(worker, batch = next, size = batch.len(), "Claimed batch");
                    done.push(self.run_batch(next, batch).await);
                }
                done
            }
        }))
        .await;

        let mut usage = TokenUsage::default();
        let mut calls = 0;
        for outcome in outcomes.into_iter().flatten() {
            usage += outcome.usage;
            calls += outcome.calls;
            results.extend(outcome.results);
        }
        results.sort_by_key(|(idx, _)| *idx);

        info!(
            batches = batches.len(),
            calls,
            input_tokens = usage.input,
            output_tokens = usage.output,
            "Adjudication finished"
        );

        AdjudicationReport {
            results: results.into_iter().map(|(_, item)| item).collect(),
            usage,
            calls,
        }
    }

    /// One batch with retries. Exhausted retries mark every item unresolved.
    async fn run_batch(&self, batch_idx: usize, batch: &[IndexedItem<'_>]) -> BatchOutcome {
        let items: Vec<&AdjudicationInputItem> = batch.iter().map(|(_, item)| *item).collect();
        let mut usage = TokenUsage::default();
        let mut calls = 0;
        let mut attempt = 0usize;

        let last_error = loop {
            calls += 1;
            match self.call_once(&items, &mut usage).await {
                Ok(verdicts) => {
                    let results = batch.iter().map(|(idx, _)| *idx).zip(verdicts).collect();
                    return BatchOutcome {
                        results,
                        usage,
                        calls,
                    };
                }
                Err(e) => {
                    if attempt >= self.config.retries {
                        break e;
                    }
                    let backoff = self.config.retry_backoff * 2u32.saturating_pow(attempt as u32);
                    warn!(batch = batch_idx, attempt, error = %e, ?backoff, "Adjudication batch failed; retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        };

        warn!(batch = batch_idx, error = %last_error, "Adjudication batch unresolved");
        let error = last_error.to_string();
        BatchOutcome {
            results: batch
                .iter()
                .map(|(idx, item)| {
                    (
                        *idx,
                        AdjudicatedItem::unresolved(
                            &item.id,
                            UnresolvedReason::ProviderFailed {
                                error: error.clone(),
                            },
                        ),
                    )
                })
                .collect(),
            usage,
            calls,
        }
    }

    async fn call_once(
        &self,
        items: &[&AdjudicationInputItem],
        usage: &mut TokenUsage,
    ) -> AdjudicationResult<Vec<AdjudicatedItem>> {
        let request = build_request(&self.config.model, items)?;
        let call = self.generator.generate_structured(&request);
        let response = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(res) => res?,
            Err(_) => {
                return Err(AdjudicationError::Timeout {
                    timeout: self.config.timeout,
                });
            }
        };
        *usage += response.usage;

        let envelope: ResponseEnvelope =
            serde_json::from_value(response.value).map_err(|e| AdjudicationError::InvalidResponse {
                reason: e.to_string(),
            })?;
        Ok(validate_batch(items, envelope.results))
    }
}
