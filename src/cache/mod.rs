//! Cache Module
//!
//! In-memory keyed cache with per-entry TTL and coalescing of concurrent
//! fetches for the same key.

mod entry;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::CacheStore;
pub use ttl::TtlCache;

// == Lookup Outcome ==
/// Result of a plain cache read.
///
/// `Miss` covers both absent and stale keys; a stale value is never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<V> {
    Hit(V),
    Miss,
}

impl<V> CacheLookup<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    pub fn into_option(self) -> Option<V> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            CacheLookup::Miss => None,
        }
    }
}
