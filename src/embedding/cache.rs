//! Query-embedding cache: fixed-capacity LRU with TTL.
//!
//! [`LruArena`] is the lock-free core: slots in a `Vec`, an index keyed by normalized
//! title, and an intrusive recency list threaded through the slots. Every operation takes
//! `now` explicitly, so eviction and expiry depend only on the access sequence and the
//! timestamps passed in. [`QueryEmbeddingCache`] wraps it in a mutex with a [`Clock`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct Slot {
    key: String,
    value: Arc<[f32]>,
    last_access: Instant,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct LruArena {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    free: Vec<usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used; evicted first.
    tail: Option<usize>,
    capacity: usize,
    ttl: Duration,
}

impl LruArena {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a live entry, marks it most recently used and restarts its TTL. Expired
    /// entries are dropped.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<Arc<[f32]>> {
        let idx = *self.index.get(key)?;
        if self.is_expired(idx, now) {
            self.remove(idx);
            return None;
        }
        self.slots[idx].last_access = now;
        self.touch(idx);
        Some(Arc::clone(&self.slots[idx].value))
    }

    /// Inserts or refreshes `key`. Returns the evicted key, if the arena was full.
    pub fn insert(&mut self, key: &str, value: Arc<[f32]>, now: Instant) -> Option<String> {
        if let Some(&idx) = self.index.get(key) {
            let slot = &mut self.slots[idx];
            slot.value = value;
            slot.last_access = now;
            self.touch(idx);
            return None;
        }

        let mut evicted = None;
        if self.index.len() >= self.capacity
            && let Some(lru) = self.tail
        {
            evicted = Some(self.remove(lru));
        }

        let slot = Slot {
            key: key.to_string(),
            value,
            last_access: now,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.index.insert(key.to_string(), idx);
        self.push_front(idx);

        evicted
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            keys.push(self.slots[idx].key.clone());
            cursor = self.slots[idx].next;
        }
        keys
    }

    fn is_expired(&self, idx: usize, now: Instant) -> bool {
        now.saturating_duration_since(self.slots[idx].last_access) >= self.ttl
    }

    fn touch(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn remove(&mut self, idx: usize) -> String {
        self.unlink(idx);
        let key = std::mem::take(&mut self.slots[idx].key);
        self.slots[idx].value = Arc::from(Vec::new());
        self.index.remove(&key);
        self.free.push(idx);
        key
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        if let Some(old) = self.head {
            self.slots[old].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }
}

/// Thread-safe query-embedding cache.
pub struct QueryEmbeddingCache {
    arena: Mutex<LruArena>,
    clock: Arc<dyn Clock>,
}

impl QueryEmbeddingCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            arena: Mutex::new(LruArena::new(capacity, ttl)),
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<[f32]>> {
        let now = self.clock.now();
        self.arena.lock().get(key, now)
    }

    pub fn insert(&self, key: &str, value: Arc<[f32]>) {
        let now = self.clock.now();
        self.arena.lock().insert(key, value, now);
    }

    pub fn len(&self) -> usize {
        self.arena.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.lock().is_empty()
    }
}

#[cfg(any(test, feature = "mock"))]
/// Clock that only moves when told to.
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

#[cfg(any(test, feature = "mock"))]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

#[cfg(any(test, feature = "mock"))]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock"))]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
