//! Cache Statistics Module
//!
//! Tracks cache hits, misses, coalesced joins and fetch outcomes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered with a fresh value
    pub hits: u64,
    /// Reads that found no entry or only a stale one
    pub misses: u64,
    /// Callers that joined an in-flight fetch instead of starting one
    pub coalesced: u64,
    /// Fetchers actually invoked
    pub fetches: u64,
    /// Fetchers that rejected
    pub fetch_failures: u64,
    /// Keys explicitly invalidated
    pub invalidations: u64,
    /// Entries currently held, fresh or stale
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was read yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Records a read answered from the cache.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Records a read that found nothing fresh.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Coalesced ==
    /// Records a caller joining a fetch already in flight.
    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    // == Record Fetch ==
    /// Records a fetcher being invoked.
    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    // == Record Fetch Failure ==
    /// Records a fetch that settled with an error.
    pub fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    // == Record Invalidation ==
    /// Records an explicit invalidation.
    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    // == Set Total Entries ==
    /// Updates the entry count after the store changes size.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
