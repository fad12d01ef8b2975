//! Fetch Sources
//!
//! A named, tiered fetcher with its TTL.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

// == Tier ==
/// Priority class of a source. Tiers run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Cheap, visually urgent data rendered first
    Critical,
    /// Charts and aggregates that may wait for the critical paint
    Deferred,
    /// Anything that may settle last
    Background,
}

impl Tier {
    /// Every tier in scheduling order.
    pub const ALL: [Tier; 3] = [Tier::Critical, Tier::Deferred, Tier::Background];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::Deferred => "deferred",
            Tier::Background => "background",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Tier::Critical),
            "deferred" => Ok(Tier::Deferred),
            "background" => Ok(Tier::Background),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

/// Zero-argument async operation producing one source's payload.
pub type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, FetchError>> + Send + Sync>;

// == Fetch Source ==
/// One registered data source of a page.
pub struct FetchSource<V> {
    /// Cache key this source populates
    pub key: String,
    pub tier: Tier,
    pub ttl: Duration,
    fetcher: Fetcher<V>,
}

impl<V> Clone for FetchSource<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            tier: self.tier,
            ttl: self.ttl,
            fetcher: self.fetcher.clone(),
        }
    }
}

impl<V> fmt::Debug for FetchSource<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSource")
            .field("key", &self.key)
            .field("tier", &self.tier)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> FetchSource<V> {
    /// Registers `fetcher` under `key`.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use dashboard_fetch::fetch::{FetchSource, Tier};
    ///
    /// let orders = FetchSource::new("order-count", Tier::Critical, Duration::from_secs(30), || async {
    ///     Ok::<_, dashboard_fetch::FetchError>(12u64)
    /// });
    /// assert_eq!(orders.key, "order-count");
    /// ```
    pub fn new<F, Fut>(key: impl Into<String>, tier: Tier, ttl: Duration, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        Self {
            key: key.into(),
            tier,
            ttl,
            fetcher: Arc::new(move || fetcher().boxed()),
        }
    }

    /// Builds a source around an already type-erased fetcher.
    pub fn from_fetcher(key: impl Into<String>, tier: Tier, ttl: Duration, fetcher: Fetcher<V>) -> Self {
        Self {
            key: key.into(),
            tier,
            ttl,
            fetcher,
        }
    }

    /// Invokes the fetcher once.
    pub fn fetch(&self) -> BoxFuture<'static, Result<V, FetchError>> {
        (self.fetcher)()
    }
}
