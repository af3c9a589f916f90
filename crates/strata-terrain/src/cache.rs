//! Bounded, thread-safe create-on-miss cache shared by the world generators.
//!
//! Values are computed outside the lock. When two threads miss the same key
//! at once both compute, the first insert wins and the loser's value is
//! dropped, so every reader of a key observes the same `Arc`.
//!
//! Eviction is by insertion order: once the entry count exceeds the
//! capacity, roughly the oldest third is dropped. Entries that are still
//! referenced elsewhere (a strong count above one) are skipped.

use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

struct Inner<K, V> {
    entries: FxHashMap<K, Arc<V>>,
    order: VecDeque<K>,
}

/// Insertion-ordered cache with batch eviction.
pub struct BoundedCache<K, V> {
    name: &'static str,
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
{
    /// Creates an empty cache. `name` only labels log events.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Returns the cached value, if present.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Returns the cached value or computes and inserts it.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> Arc<V> {
        if let Some(hit) = self.get(&key) {
            return hit;
        }

        let value = Arc::new(make());

        let mut inner = self.inner.lock();
        if let Some(existing) = inner.entries.get(&key) {
            return Arc::clone(existing);
        }
        inner.entries.insert(key, Arc::clone(&value));
        inner.order.push_back(key);
        if inner.entries.len() > self.capacity {
            self.evict(&mut inner, key);
        }
        value
    }

    /// Drops about a third of the entries, oldest first. Must be called with
    /// the lock held so it never races the insert that triggered it.
    fn evict(&self, inner: &mut Inner<K, V>, keep: K) {
        let target = (inner.entries.len() / 3).max(1);
        let mut evicted = 0;
        let mut retained = Vec::new();

        while evicted < target {
            let Some(key) = inner.order.pop_front() else {
                break;
            };
            let in_use = key == keep
                || inner
                    .entries
                    .get(&key)
                    .is_some_and(|v| Arc::strong_count(v) > 1);
            if in_use {
                retained.push(key);
            } else {
                inner.entries.remove(&key);
                evicted += 1;
            }
        }

        // Retained keys keep their age.
        for key in retained.iter().rev() {
            inner.order.push_front(*key);
        }

        debug!(
            cache = self.name,
            evicted,
            retained = retained.len(),
            remaining = inner.entries.len(),
            "Cache eviction"
        );
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` is cached.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_hit_returns_same_arc() {
        let cache = BoundedCache::new("test", 8);
        let a = cache.get_or_insert_with(1, || "one".to_string());
        let b = cache.get_or_insert_with(1, || panic!("must not recompute"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_third() {
        let cache = BoundedCache::new("test", 9);
        for k in 0..10 {
            cache.get_or_insert_with(k, || k * 10);
        }
        assert_eq!(cache.len(), 7, "10 entries over capacity 9 drop a third");
        for k in 0..3 {
            assert!(!cache.contains(&k), "oldest key {k} should be evicted");
        }
        for k in 3..10 {
            assert!(cache.contains(&k), "key {k} should survive");
        }
    }

    #[test]
    fn test_referenced_entries_survive_eviction() {
        let cache = BoundedCache::new("test", 3);
        let held = cache.get_or_insert_with(0, || 0);
        for k in 1..4 {
            cache.get_or_insert_with(k, || k);
        }
        assert!(cache.contains(&0), "an entry in use must not be evicted");
        assert!(!cache.contains(&1), "the next oldest goes instead");
        drop(held);

        for k in 4..6 {
            cache.get_or_insert_with(k, || k);
        }
        assert!(!cache.contains(&0), "once released the entry is evictable again");
    }

    #[test]
    fn test_concurrent_misses_converge() {
        let cache = Arc::new(BoundedCache::new("test", 64));
        let computed = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let computed = Arc::clone(&computed);
                std::thread::spawn(move || {
                    cache.get_or_insert_with(7, || {
                        computed.fetch_add(1, Ordering::SeqCst);
                        vec![1, 2, 3]
                    })
                })
            })
            .collect();
        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(computed.load(Ordering::SeqCst) >= 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])), "all readers see one entry");
        assert_eq!(cache.len(), 1);
    }
}
