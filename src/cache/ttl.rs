//! Shared TTL Cache
//!
//! Wraps a [`CacheStore`] with the in-flight table that lets concurrent
//! `get_or_populate` calls for one key share a single fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::cache::{CacheLookup, CacheStats, CacheStore};
use crate::error::FetchError;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;

/// A fetch currently running for one key.
struct InFlight<V> {
    /// Identifies the flight so a detached one cannot write back
    id: u64,
    ttl: Duration,
    fetch: SharedFetch<V>,
}

struct Inner<V> {
    store: CacheStore<V>,
    in_flight: HashMap<String, InFlight<V>>,
    next_flight: u64,
}

// == TTL Cache ==
/// Page-owned cache shared by every fetch source of that page.
///
/// The lock is only held for synchronous bookkeeping, never across a fetch.
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: CacheStore::new(),
                in_flight: HashMap::new(),
                next_flight: 0,
            }),
        }
    }
}

impl<V> TtlCache<V> {
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Invalidate ==
    /// Forces the next read of `key` to miss, and detaches any fetch in flight
    /// for it so the next `get_or_populate` starts a new one.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.lock();
        if inner.in_flight.remove(key).is_some() {
            debug!(key, "detached in-flight fetch");
        }
        inner.store.invalidate(key)
    }

    /// Invalidates every listed key. Returns how many held an entry.
    pub fn invalidate_all<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        keys.iter()
            .filter(|key| self.invalidate(key.as_ref()))
            .count()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().store.stats()
    }

    /// Number of fetches currently registered as in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the value for `key` only while it is fresh.
    pub fn get(&self, key: &str) -> CacheLookup<V> {
        self.lock().store.get(key)
    }

    // == Set ==
    /// Unconditionally overwrites `key`, restarting its TTL.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        self.lock().store.set(key, value, ttl);
    }

    // == Get Or Populate ==
    /// Resolves `key` from the cache, or by invoking `fetcher` exactly once.
    ///
    /// Callers arriving while a fetch for `key` is in flight join it instead
    /// of invoking their own fetcher. On success the value is stored with the
    /// TTL of the caller that started the flight; on failure the error is
    /// returned to every joined caller and the cache is left untouched.
    pub async fn get_or_populate<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
    ) -> Result<V, FetchError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let (flight_id, fetch) = {
            let mut guard = self.lock();
            let inner = &mut *guard;

            if let CacheLookup::Hit(value) = inner.store.get(key) {
                debug!(key, "cache hit");
                return Ok(value);
            }

            match inner.in_flight.get(key) {
                Some(flight) => {
                    inner.store.stats_mut().record_coalesced();
                    debug!(key, flight = flight.id, "joined in-flight fetch");
                    (flight.id, flight.fetch.clone())
                }
                None => {
                    inner.next_flight += 1;
                    let id = inner.next_flight;
                    // The fetcher runs on first poll, after the lock is released.
                    let fetch = async move { fetcher().await }.boxed().shared();
                    inner.store.stats_mut().record_fetch();
                    inner.in_flight.insert(
                        key.to_string(),
                        InFlight {
                            id,
                            ttl,
                            fetch: fetch.clone(),
                        },
                    );
                    debug!(key, flight = id, "started fetch");
                    (id, fetch)
                }
            }
        };

        let result = fetch.await;
        self.settle(key, flight_id, &result);
        result
    }

    /// Writes back a finished flight if it is still the registered one.
    ///
    /// Every joined caller reaches this; only the first finds its flight
    /// registered, so the write happens once.
    fn settle(&self, key: &str, flight_id: u64, result: &Result<V, FetchError>) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let ttl = match inner.in_flight.get(key) {
            Some(flight) if flight.id == flight_id => flight.ttl,
            _ => return,
        };
        inner.in_flight.remove(key);

        match result {
            Ok(value) => inner.store.set(key, value.clone(), ttl),
            Err(_) => inner.store.stats_mut().record_fetch_failure(),
        }
    }
}
