//! Cache Entry Module
//!
//! Defines a cached value together with the time it was written and its TTL.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single cached value with its validity window.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Last successfully fetched value
    pub value: V,
    /// When the value was stored
    pub written_at: Instant,
    /// Validity window measured from `written_at`
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written at `now`.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            value,
            written_at: now,
            ttl,
        }
    }

    // == Freshness ==
    /// Returns true while `now - written_at < ttl`.
    ///
    /// Boundary condition: the entry turns stale at exactly `written_at + ttl`.
    /// A `now` earlier than `written_at` counts as zero elapsed time.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) < self.ttl
    }

    /// Freshness against the current (tokio) clock.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    // == Time To Live ==
    /// Remaining validity at `now`, zero once stale.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.written_at))
    }
}
