//! BM25 lexical index over taxonomy leaves.
//!
//! Each leaf is one document: the distinct normalized tokens of its sous-famille, famille,
//! rayon and sector names. Because a document is a token *set*, every term frequency is 1.


use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{BM25_B, BM25_K1};
use crate::normalize::tokenize;
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalHit {
    pub leaf_key: String,
    pub score: f32,
}

/// Inverted index built once per taxonomy snapshot.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    doc_keys: Vec<String>,
    doc_len: Vec<f32>,
    avg_doc_len: f32,
    postings: HashMap<String, Vec<usize>>,
    idf: HashMap<String, f32>,
}

impl Bm25Index {
    pub fn build(taxonomy: &Taxonomy) -> Self {
        let mut doc_keys = Vec::with_capacity(taxonomy.len());
        let mut doc_len = Vec::with_capacity(taxonomy.len());
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();

        for (doc, leaf) in taxonomy.leaves().iter().enumerate() {
            let mut terms: Vec<String> = Vec::new();
            let mut seen = HashSet::new();
            for name in leaf.label_names() {
                for token in tokenize(name) {
                    if seen.insert(token.clone()) {
                        terms.push(token);
                    }
                }
            }

            doc_len.push(terms.len().max(1) as f32);
            for term in terms {
                postings.entry(term).or_default().push(doc);
            }
            doc_keys.push(leaf.leaf_key.clone());
        }

        let n = doc_keys.len() as f32;
        let avg_doc_len = if doc_len.is_empty() {
            1.0
        } else {
            doc_len.iter().sum::<f32>() / n
        };

        let idf = postings
            .iter()
            .map(|(term, docs)| {
                let df = docs.len() as f32;
                (term.clone(), (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        debug!(
            documents = doc_keys.len(),
            terms = postings.len(),
            avg_doc_len,
            "BM25 index built"
        );

        Self {
            doc_keys,
            doc_len,
            avg_doc_len,
            postings,
            idf,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_keys.is_empty()
    }

    /// Up to `top_n` leaves sharing at least one token with `query`, best first.
    ///
    /// Ties keep taxonomy order. A query with no indexed tokens returns nothing.
    pub fn search(&self, query: &str, top_n: usize) -> Vec<LexicalHit> {
        if top_n == 0 || self.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<usize, f32> = HashMap::new();
        for term in tokenize(query) {
            let (Some(docs), Some(&idf)) = (self.postings.get(&term), self.idf.get(&term)) else {
                continue;
            };
            for &doc in docs {
                let norm = 1.0 - BM25_B + BM25_B * self.doc_len[doc] / self.avg_doc_len;
                let tf_part = (BM25_K1 + 1.0) / (1.0 + BM25_K1 * norm);
                *scores.entry(doc).or_insert(0.0) += idf * tf_part;
            }
        }

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(top_n);

        ranked
            .into_iter()
            .map(|(doc, score)| LexicalHit {
                leaf_key: self.doc_keys[doc].clone(),
                score,
            })
            .collect()
    }
}
