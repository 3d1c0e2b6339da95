//! Memoized embedding cache.
//!
//! Bounded LRU keyed by `hash(model + text)`, with a TTL so stale vectors
//! age out when models are re-deployed. Entries are never mutated, only
//! replaced.

use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Cache key: 64-bit hash of model and text.
pub fn cache_key(model: &str, text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    // Separator prevents ("ab", "c") colliding with ("a", "bc").
    0u8.hash(&mut hasher);
    text.hash(&mut hasher);
    hasher.finish()
}

struct CacheEntry {
    values: Vec<f32>,
    cached_at: Instant,
}

/// Bounded TTL cache for embedding vectors.
pub struct EmbeddingCache {
    entries: LruCache<u64, CacheEntry>,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl EmbeddingCache {
    /// Create a cache holding at most `capacity` vectors for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a cached vector, evicting it if expired.
    pub fn get(&mut self, key: u64) -> Option<Vec<f32>> {
        let expired = match self.entries.get(&key) {
            Some(entry) => entry.cached_at.elapsed() > self.ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };
        if expired {
            self.entries.pop(&key);
            self.misses += 1;
            return None;
        }
        self.hits += 1;
        self.entries.get(&key).map(|e| e.values.clone())
    }

    /// Insert a vector, replacing any existing entry.
    pub fn insert(&mut self, key: u64, values: Vec<f32>) {
        self.entries.put(
            key,
            CacheEntry {
                values,
                cached_at: Instant::now(),
            },
        );
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifetime (hits, misses) counters.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_distinguishes_model_and_text() {
        assert_ne!(cache_key("m1", "text"), cache_key("m2", "text"));
        assert_ne!(cache_key("m", "text a"), cache_key("m", "text b"));
        assert_ne!(cache_key("ab", "c"), cache_key("a", "bc"));
        assert_eq!(cache_key("m", "same"), cache_key("m", "same"));
    }

    #[test]
    fn test_hit_and_miss() {
        let mut cache = EmbeddingCache::new(10, Duration::from_secs(60));
        let key = cache_key("m", "hello");
        assert!(cache.get(key).is_none());

        cache.insert(key, vec![1.0, 2.0]);
        assert_eq!(cache.get(key), Some(vec![1.0, 2.0]));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = EmbeddingCache::new(10, Duration::ZERO);
        let key = cache_key("m", "hello");
        cache.insert(key, vec![1.0]);
        // Zero TTL: entry is expired on the next lookup.
        assert!(cache.get(key).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_bound() {
        let mut cache = EmbeddingCache::new(2, Duration::from_secs(60));
        cache.insert(1, vec![1.0]);
        cache.insert(2, vec![2.0]);
        cache.insert(3, vec![3.0]);
        assert_eq!(cache.len(), 2);
        // Least recently used entry was evicted.
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut cache = EmbeddingCache::new(0, Duration::from_secs(60));
        cache.insert(1, vec![1.0]);
        assert_eq!(cache.len(), 1);
    }
}
