use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use super::types::Candidate;
use crate::constants::{DEFAULT_CANDIDATE_CACHE_CAPACITY, DEFAULT_CANDIDATE_CACHE_TTL};
use crate::hashing::hash_title;

/// Fused candidate lists keyed by the BLAKE3 hash of the normalized title.
#[derive(Clone)]
pub struct CandidateCache {
    entries: Cache<[u8; 32], Arc<Vec<Candidate>>>,
}

impl CandidateCache {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CANDIDATE_CACHE_CAPACITY, DEFAULT_CANDIDATE_CACHE_TTL)
    }

    pub fn with_limits(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    #[inline]
    pub fn get(&self, normalized: &str) -> Option<Arc<Vec<Candidate>>> {
        self.entries.get(&hash_title(normalized))
    }

    #[inline]
    pub fn insert(&self, normalized: &str, candidates: Arc<Vec<Candidate>>) {
        self.entries.insert(hash_title(normalized), candidates);
    }

    /// Approximate; pending maintenance is not flushed.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for CandidateCache {
    fn default() -> Self {
        Self::new()
    }
}
