//! Bounded metadata cache
//!
//! Entries expire after a fixed time-to-live; once the cache is full the
//! oldest insertion is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 64;
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: Instant,
}

pub struct MetadataCache<V> {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<String, CacheEntry<V>>,
    order: VecDeque<String>,
}

impl<V> MetadataCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Look up a live entry; expired entries are dropped on access
    pub fn get(&mut self, key: &str) -> Option<Arc<V>> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };

        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Arc<V> {
        let key = key.into();
        self.remove(&key);

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        let value = Arc::new(value);
        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                inserted_at: Instant::now(),
            },
        );
        value
    }

    pub fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MetadataCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
