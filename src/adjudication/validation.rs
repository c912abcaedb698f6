//! Closed-world check of a batch response.
//!
//! A row is accepted only if its `(sous_famille_code, full_path)` pair equals one of the
//! candidates offered for that id. The accepted verdict carries the offered candidate,
//! not the model's copy of it.

use std::collections::HashMap;

use tracing::warn;

use super::types::{AdjudicatedItem, AdjudicationInputItem, ResponseRow, UnresolvedReason};

/// 1-based position of the candidate matching `row`, if any.
pub fn match_rank(item: &AdjudicationInputItem, row: &ResponseRow) -> Option<usize> {
    item.candidates
        .iter()
        .position(|c| c.full_path == row.full_path && c.sous_famille.code == row.sous_famille_code)
        .map(|i| i + 1)
}

/// One verdict per input item, in input order.
pub fn validate_batch(
    batch: &[&AdjudicationInputItem],
    rows: Vec<ResponseRow>,
) -> Vec<AdjudicatedItem> {
    let mut by_id: HashMap<String, ResponseRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        if !batch.iter().any(|item| item.id == row.id) {
            warn!(id = %row.id, "Adjudication returned an unknown id");
            continue;
        }
        if by_id.contains_key(&row.id) {
            warn!(id = %row.id, "Adjudication returned a duplicate id; keeping the first");
            continue;
        }
        by_id.insert(row.id.clone(), row);
    }

    batch
        .iter()
        .map(|item| {
            let Some(row) = by_id.remove(&item.id) else {
                warn!(id = %item.id, "Adjudication omitted an item");
                return AdjudicatedItem::unresolved(&item.id, UnresolvedReason::MissingFromResponse);
            };

            match match_rank(item, &row) {
                Some(rank) => {
                    AdjudicatedItem::chosen(&item.id, item.candidates[rank - 1].clone(), rank)
                }
                None => {
                    warn!(
                        id = %item.id,
                        sous_famille_code = %row.sous_famille_code,
                        full_path = %row.full_path,
                        "Adjudication chose a leaf outside the candidate list"
                    );
                    AdjudicatedItem::unresolved(
                        &item.id,
                        UnresolvedReason::NotAmongCandidates {
                            sous_famille_code: row.sous_famille_code,
                            full_path: row.full_path,
                        },
                    )
                }
            }
        })
        .collect()
}
