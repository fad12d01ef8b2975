//! Cache Store Module
//!
//! Synchronous keyed storage with TTL freshness checks. Stale entries are
//! never swept; they are reported as misses and replaced on the next write.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheLookup, CacheStats};

// == Cache Store ==
/// Keyed map of [`CacheEntry`] values plus statistics.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    // == Set ==
    /// Overwrites the entry for `key`, resetting its write time to now.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    pub(crate) fn set_at(&mut self, key: impl Into<String>, value: V, ttl: Duration, now: Instant) {
        self.entries
            .insert(key.into(), CacheEntry::new(value, ttl, now));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Returns whether one existed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.record_invalidation();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    /// Removes every listed key, returning how many entries existed.
    pub fn invalidate_all<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        keys.iter()
            .filter(|key| self.invalidate(key.as_ref()))
            .count()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    // == Length ==
    /// Number of entries held, including stale ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently holding an entry.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Returns the value only while it is fresh.
    ///
    /// A stale entry is left in place and reported as [`CacheLookup::Miss`].
    pub fn get(&mut self, key: &str) -> CacheLookup<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: Instant) -> CacheLookup<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => {
                self.stats.record_hit();
                CacheLookup::Hit(entry.value.clone())
            }
            _ => {
                self.stats.record_miss();
                CacheLookup::Miss
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(1000);

    #[test]
    fn test_store_new() {
        let store: CacheStore<u32> = CacheStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new();

        store.set("sales-performance", 42, TTL);

        assert_eq!(store.get("sales-performance"), CacheLookup::Hit(42));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store: CacheStore<u32> = CacheStore::new();
        assert_eq!(store.get("nonexistent"), CacheLookup::Miss);
    }

    #[test]
    fn test_store_overwrite_resets_write_time() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set_at("x", 1, TTL, t0);
        store.set_at("x", 2, TTL, t0 + Duration::from_millis(900));

        assert_eq!(
            store.get_at("x", t0 + Duration::from_millis(1500)),
            CacheLookup::Hit(2)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_entry_is_miss_but_kept() {
        let mut store = CacheStore::new();
        let t0 = Instant::now();

        store.set_at("x", 5, TTL, t0);

        assert_eq!(store.get_at("x", t0 + Duration::from_millis(500)), CacheLookup::Hit(5));
        assert_eq!(store.get_at("x", t0 + Duration::from_millis(1500)), CacheLookup::Miss);
        assert_eq!(store.len(), 1, "stale entries are not deleted by reads");
    }

    #[test]
    fn test_store_invalidate() {
        let mut store = CacheStore::new();

        store.set("x", 5, TTL);
        assert!(store.invalidate("x"));
        assert!(!store.invalidate("x"));

        assert!(store.is_empty());
        assert_eq!(store.get("x"), CacheLookup::Miss);
    }

    #[test]
    fn test_store_invalidate_all() {
        let mut store = CacheStore::new();

        store.set("a", 1, TTL);
        store.set("b", 2, TTL);
        store.set("c", 3, TTL);

        let removed = store.invalidate_all(&["a", "b", "missing"]);

        assert_eq!(removed, 2);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new();

        store.set("key1", "value1", TTL);
        let _ = store.get("key1");
        let _ = store.get("nonexistent");
        store.invalidate("key1");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.total_entries, 0);
    }
}
