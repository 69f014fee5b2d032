//! Embedding cache capability.
//!
//! The cache is injected rather than a module-level singleton so callers
//! and tests can choose an eviction policy. Lookups are best-effort
//! memoization keyed by exact input text — never a correctness dependency.

use std::num::NonZeroUsize;

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;

pub trait EmbeddingCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<f32>>;
    fn insert(&self, key: String, vector: Vec<f32>);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-memory cache with no TTL. Grows until `clear` is called —
/// callers needing bounded memory must clear it periodically or use
/// [`BoundedCache`].
#[derive(Default)]
pub struct UnboundedCache {
    entries: DashMap<String, Vec<f32>>,
}

impl UnboundedCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EmbeddingCache for UnboundedCache {
    fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn insert(&self, key: String, vector: Vec<f32>) {
        self.entries.insert(key, vector);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// LRU-evicting cache for callers that need bounded memory.
pub struct BoundedCache {
    entries: Mutex<LruCache<String, Vec<f32>>>,
}

impl BoundedCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl EmbeddingCache for BoundedCache {
    fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.entries.lock().get(key).cloned()
    }

    fn insert(&self, key: String, vector: Vec<f32>) {
        self.entries.lock().put(key, vector);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Cache that never stores anything. For tests and one-shot callers.
pub struct NoopCache;

impl EmbeddingCache for NoopCache {
    fn get(&self, _key: &str) -> Option<Vec<f32>> {
        None
    }

    fn insert(&self, _key: String, _vector: Vec<f32>) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_cache_round_trip_and_clear() {
        let cache = UnboundedCache::new();
        cache.insert("query".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("query"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("other"), None);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounded_cache_evicts_least_recently_used() {
        let cache = BoundedCache::new(2);
        cache.insert("a".to_string(), vec![1.0]);
        cache.insert("b".to_string(), vec![2.0]);
        cache.get("a");
        cache.insert("c".to_string(), vec![3.0]);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_noop_cache_stores_nothing() {
        let cache = NoopCache;
        cache.insert("a".to_string(), vec![1.0]);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 0);
    }
}
