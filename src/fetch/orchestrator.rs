//! Fetch Orchestrator
//!
//! Runs a page's sources tier by tier against a shared [`TtlCache`],
//! settling every source of a tier before delivering it and moving on.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::error::{DashboardError, Result};
use crate::fetch::{FetchSession, FetchSource, SessionState, Tier, TierReport, TierResults, TierSink};

// == Orchestrator Config ==
/// Scheduling knobs for an [`Orchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Pause between delivering one tier and starting the next.
    /// Zero yields to the runtime once instead of sleeping.
    pub tier_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tier_delay: Duration::from_millis(50),
        }
    }
}

// == Orchestrator ==
/// Tiered, failure-isolating fetch scheduler for one page.
pub struct Orchestrator<V> {
    cache: Arc<TtlCache<V>>,
    sources: Vec<FetchSource<V>>,
    config: OrchestratorConfig,
    last_session: AtomicU64,
}

impl<V> Orchestrator<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Builds an orchestrator over `sources`, all populating `cache`.
    ///
    /// Fails when no sources are given or two sources share a key.
    pub fn new(
        cache: Arc<TtlCache<V>>,
        sources: Vec<FetchSource<V>>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        if sources.is_empty() {
            return Err(DashboardError::NoSources);
        }

        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.key.as_str()) {
                return Err(DashboardError::DuplicateKey(source.key.clone()));
            }
        }

        Ok(Self {
            cache,
            sources,
            config,
            last_session: AtomicU64::new(0),
        })
    }

    pub fn cache(&self) -> &Arc<TtlCache<V>> {
        &self.cache
    }

    pub fn sources(&self) -> &[FetchSource<V>] {
        &self.sources
    }

    /// Every registered key, in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.key.clone()).collect()
    }

    /// Tiers with at least one source, in scheduling order.
    pub fn tiers(&self) -> Vec<Tier> {
        Tier::ALL
            .into_iter()
            .filter(|tier| self.sources.iter().any(|s| s.tier == *tier))
            .collect()
    }

    /// Allocates the id for a new session. Ids increase from 1.
    pub fn next_session_id(&self) -> u64 {
        self.last_session.fetch_add(1, Ordering::SeqCst) + 1
    }

    // == Run Tier ==
    /// Resolves every source of `tier` concurrently and waits for all of them.
    ///
    /// A rejected source becomes an `Err` entry; it never cancels its siblings.
    pub async fn run_tier(&self, tier: Tier) -> TierResults<V> {
        let lookups = self
            .sources
            .iter()
            .filter(|source| source.tier == tier)
            .map(|source| async move {
                let owned = source.clone();
                let result = self
                    .cache
                    .get_or_populate(&source.key, source.ttl, move || owned.fetch())
                    .await;
                if let Err(err) = &result {
                    warn!(key = %source.key, %tier, error = %err, "source fetch failed");
                }
                (source.key.clone(), result)
            });

        join_all(lookups).await.into_iter().collect()
    }

    // == Run ==
    /// Runs a new session, delivering each tier to `sink` as it settles.
    pub async fn run<S: TierSink<V>>(&self, sink: S) -> FetchSession<V> {
        let id = self.next_session_id();
        self.run_session(id, sink).await
    }

    /// Runs a session under an id previously taken from [`Self::next_session_id`].
    ///
    /// Each tier is delivered before the next tier's fetchers are invoked.
    pub async fn run_session<S: TierSink<V>>(&self, session_id: u64, mut sink: S) -> FetchSession<V> {
        let mut session = FetchSession::new(session_id);
        let tiers = self.tiers();
        info!(session = session_id, tiers = tiers.len(), "session started");

        for (index, tier) in tiers.iter().copied().enumerate() {
            if index > 0 {
                self.yield_between_tiers().await;
            }

            session.transition(SessionState::Running(tier));
            let results = self.run_tier(tier).await;
            session.transition(SessionState::Settled(tier));

            let report = TierReport {
                session_id,
                tier,
                results,
            };
            debug!(
                session = session_id,
                %tier,
                sources = report.results.len(),
                failures = report.failures(),
                "tier settled"
            );
            sink.deliver(report.clone());
            session.record(report);
        }

        session.transition(SessionState::Complete);
        info!(session = session_id, "session complete");
        session
    }

    // == Refresh ==
    /// Invalidates `keys` and runs a new session.
    ///
    /// Every key must belong to a registered source; nothing is invalidated
    /// otherwise.
    pub async fn refresh<K, S>(&self, keys: &[K], sink: S) -> Result<FetchSession<V>>
    where
        K: AsRef<str>,
        S: TierSink<V>,
    {
        let id = self.prepare_refresh(keys)?;
        Ok(self.run_session(id, sink).await)
    }

    /// Invalidates every registered key and runs a new session.
    pub async fn refresh_all<S: TierSink<V>>(&self, sink: S) -> FetchSession<V> {
        let keys = self.keys();
        self.cache.invalidate_all(keys.as_slice());
        info!(keys = keys.len(), "refreshing all sources");
        self.run(sink).await
    }

    /// Validates and invalidates `keys`, returning the id for the refresh session.
    pub fn prepare_refresh<K: AsRef<str>>(&self, keys: &[K]) -> Result<u64> {
        for key in keys {
            let key = key.as_ref();
            if !self.sources.iter().any(|s| s.key == key) {
                return Err(DashboardError::UnknownKey(key.to_string()));
            }
        }

        let invalidated = self.cache.invalidate_all(keys);
        info!(requested = keys.len(), invalidated, "refresh requested");
        Ok(self.next_session_id())
    }

    async fn yield_between_tiers(&self) {
        if self.config.tier_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.config.tier_delay).await;
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheLookup;
    use crate::error::FetchError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    const TTL: Duration = Duration::from_secs(60);

    type Log = Arc<Mutex<Vec<String>>>;

    /// Source that appends "fetch:<key>" to `log` and resolves to `result`.
    fn logged_source(
        log: &Log,
        key: &'static str,
        tier: Tier,
        result: std::result::Result<u32, FetchError>,
    ) -> FetchSource<u32> {
        let log = log.clone();
        FetchSource::new(key, tier, TTL, move || {
            log.lock().unwrap().push(format!("fetch:{}", key));
            let result = result.clone();
            async move { result }
        })
    }

    fn orchestrator(sources: Vec<FetchSource<u32>>) -> Orchestrator<u32> {
        Orchestrator::new(
            Arc::new(TtlCache::new()),
            sources,
            OrchestratorConfig {
                tier_delay: Duration::ZERO,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_empty_sources() {
        let result = Orchestrator::<u32>::new(
            Arc::new(TtlCache::new()),
            vec![],
            OrchestratorConfig::default(),
        );
        assert!(matches!(result, Err(DashboardError::NoSources)));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let log = Log::default();
        let result = Orchestrator::new(
            Arc::new(TtlCache::new()),
            vec![
                logged_source(&log, "a", Tier::Critical, Ok(1)),
                logged_source(&log, "a", Tier::Deferred, Ok(2)),
            ],
            OrchestratorConfig::default(),
        );
        assert!(matches!(result, Err(DashboardError::DuplicateKey(k)) if k == "a"));
    }

    #[test]
    fn test_session_ids_increase() {
        let log = Log::default();
        let orch = orchestrator(vec![logged_source(&log, "a", Tier::Critical, Ok(1))]);
        assert_eq!(orch.next_session_id(), 1);
        assert_eq!(orch.next_session_id(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let log = Log::default();
        let orch = orchestrator(vec![
            logged_source(&log, "orders", Tier::Critical, Ok(12)),
            logged_source(&log, "chat-status", Tier::Critical, Err(FetchError::Status(503))),
            logged_source(&log, "revenue", Tier::Critical, Ok(900)),
        ]);

        let results = orch.run_tier(Tier::Critical).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results["orders"], Ok(12));
        assert_eq!(results["revenue"], Ok(900));
        assert_eq!(results["chat-status"], Err(FetchError::Status(503)));
    }

    #[tokio::test]
    async fn test_critical_delivered_before_deferred_fetches() {
        let log = Log::default();
        let orch = orchestrator(vec![
            logged_source(&log, "a", Tier::Critical, Ok(1)),
            logged_source(&log, "b", Tier::Critical, Err(FetchError::failed("boom"))),
            logged_source(&log, "c", Tier::Deferred, Ok(3)),
        ]);

        let sink_log = log.clone();
        let mut delivered = Vec::new();
        let session = orch
            .run(|report: TierReport<u32>| {
                sink_log.lock().unwrap().push(format!("deliver:{}", report.tier));
                delivered.push(report);
            })
            .await;

        let events = log.lock().unwrap().clone();
        let delivered_critical = events.iter().position(|e| e == "deliver:critical").unwrap();
        let fetched_c = events.iter().position(|e| e == "fetch:c").unwrap();
        assert!(delivered_critical < fetched_c, "events: {:?}", events);

        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].tier, Tier::Critical);
        assert_eq!(delivered[0].results["a"], Ok(1));
        assert_eq!(delivered[0].results["b"], Err(FetchError::failed("boom")));
        assert_eq!(delivered[1].tier, Tier::Deferred);
        assert_eq!(delivered[1].results["c"], Ok(3));
        assert_eq!(delivered[1].results.len(), 1);

        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(
            session.trail(),
            &[
                SessionState::Idle,
                SessionState::Running(Tier::Critical),
                SessionState::Settled(Tier::Critical),
                SessionState::Running(Tier::Deferred),
                SessionState::Settled(Tier::Deferred),
                SessionState::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_background_tier_runs_last() {
        let log = Log::default();
        let orch = orchestrator(vec![
            logged_source(&log, "bg", Tier::Background, Ok(9)),
            logged_source(&log, "a", Tier::Critical, Ok(1)),
        ]);

        let session = orch.run(crate::fetch::Discard).await;

        let tiers: Vec<Tier> = session.reports().iter().map(|r| r.tier).collect();
        assert_eq!(tiers, vec![Tier::Critical, Tier::Background]);
        assert_eq!(*log.lock().unwrap(), vec!["fetch:a", "fetch:bg"]);
    }

    #[tokio::test]
    async fn test_second_run_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let orch = orchestrator(vec![FetchSource::new("x", Tier::Critical, TTL, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(5) }
        })]);

        orch.run(crate::fetch::Discard).await;
        let session = orch.run(crate::fetch::Discard).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.result("x"), Some(&Ok(5)));
        assert_eq!(session.id, 2);
    }

    #[tokio::test]
    async fn test_deferred_source_derived_from_critical() {
        let cache = Arc::new(TtlCache::new());
        let reader = cache.clone();
        let orch = Orchestrator::new(
            cache,
            vec![
                FetchSource::new("orders", Tier::Critical, TTL, || async { Ok(12) }),
                FetchSource::new("orders-doubled", Tier::Deferred, TTL, move || {
                    let orders = reader.get("orders").into_option();
                    async move { orders.map(|n| n * 2).ok_or_else(|| FetchError::failed("no orders")) }
                }),
            ],
            OrchestratorConfig {
                tier_delay: Duration::ZERO,
            },
        )
        .unwrap();

        let session = tokio::time::timeout(Duration::from_secs(2), orch.run(crate::fetch::Discard))
            .await
            .unwrap();

        assert_eq!(session.result("orders-doubled"), Some(&Ok(24)));
    }

    #[tokio::test]
    async fn test_refresh_bypasses_fresh_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let orch = orchestrator(vec![FetchSource::new("x", Tier::Critical, TTL, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as u32;
            async move { Ok(100 + n) }
        })]);
        orch.cache().set("x", 5, Duration::from_millis(1000));

        let session = orch.refresh(&["x"], crate::fetch::Discard).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.result("x"), Some(&Ok(100)));
        assert_eq!(orch.cache().get("x"), CacheLookup::Hit(100));
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_key() {
        let log = Log::default();
        let orch = orchestrator(vec![logged_source(&log, "a", Tier::Critical, Ok(1))]);
        orch.cache().set("a", 1, TTL);

        let result = orch.refresh(&["a", "nope"], crate::fetch::Discard).await;

        assert!(matches!(result, Err(DashboardError::UnknownKey(k)) if k == "nope"));
        assert_eq!(orch.cache().get("a"), CacheLookup::Hit(1), "nothing invalidated");
    }

    #[tokio::test]
    async fn test_refresh_all_refetches_everything() {
        let log = Log::default();
        let orch = orchestrator(vec![
            logged_source(&log, "a", Tier::Critical, Ok(1)),
            logged_source(&log, "b", Tier::Deferred, Ok(2)),
        ]);

        orch.run(crate::fetch::Discard).await;
        orch.refresh_all(crate::fetch::Discard).await;

        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tier_delay_is_applied() {
        let log = Log::default();
        let orch = Orchestrator::new(
            Arc::new(TtlCache::new()),
            vec![
                logged_source(&log, "a", Tier::Critical, Ok(1)),
                logged_source(&log, "b", Tier::Deferred, Ok(2)),
            ],
            OrchestratorConfig {
                tier_delay: Duration::from_millis(250),
            },
        )
        .unwrap();

        let start = tokio::time::Instant::now();
        orch.run(crate::fetch::Discard).await;

        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
