//! Dashboard Module
//!
//! A page: one orchestrator plus the view state its reports are applied to.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::fetch::{FetchSession, Orchestrator, TierReport};
use crate::view::DashboardView;

pub struct Dashboard<V> {
    orchestrator: Orchestrator<V>,
    view: RwLock<DashboardView<V>>,
}

impl<V> Dashboard<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(orchestrator: Orchestrator<V>) -> Self {
        let view = DashboardView::for_sources(orchestrator.sources());
        Self {
            orchestrator,
            view: RwLock::new(view),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<V> {
        &self.orchestrator
    }

    fn view(&self) -> RwLockReadGuard<'_, DashboardView<V>> {
        self.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn view_mut(&self) -> RwLockWriteGuard<'_, DashboardView<V>> {
        self.view.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current view state.
    pub fn snapshot(&self) -> DashboardView<V> {
        self.view().clone()
    }

    /// Marks `session_id` as the newest session of this page.
    pub fn begin(&self, session_id: u64) -> bool {
        self.view_mut().begin(session_id)
    }

    /// Applies a report unless a newer session has superseded it.
    pub fn apply(&self, report: TierReport<V>) -> bool {
        self.view_mut().apply(report)
    }

    // == Load ==
    /// Mount: runs a new session and applies each tier as it settles.
    pub async fn load(&self) -> FetchSession<V> {
        let id = self.orchestrator.next_session_id();
        self.run(id).await
    }

    // == Refresh ==
    /// Invalidates `keys` (all keys when empty) and runs a new session.
    pub async fn refresh(&self, keys: &[String]) -> Result<FetchSession<V>> {
        let id = self.prepare_refresh(keys)?;
        Ok(self.run(id).await)
    }

    /// Validates and invalidates `keys` (all when empty), returning the new session id.
    pub fn prepare_refresh(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            self.orchestrator
                .prepare_refresh(self.orchestrator.keys().as_slice())
        } else {
            self.orchestrator.prepare_refresh(keys)
        }
    }

    /// Runs the session `id` into this page's view.
    pub async fn run(&self, id: u64) -> FetchSession<V> {
        self.begin(id);
        self.orchestrator
            .run_session(id, |report: TierReport<V>| {
                self.apply(report);
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::error::FetchError;
    use crate::fetch::{FetchSource, OrchestratorConfig, Tier};
    use crate::view::SlotStatus;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn dashboard(calls: Arc<AtomicU32>) -> Dashboard<u32> {
        let sources = vec![
            FetchSource::new("orders", Tier::Critical, Duration::from_secs(60), move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n) }
            }),
            FetchSource::new("chat-status", Tier::Critical, Duration::from_secs(60), || async {
                Err(FetchError::Transport("connection refused".into()))
            }),
            FetchSource::new("category-chart", Tier::Deferred, Duration::from_secs(300), || async {
                Ok(77)
            }),
        ];
        let orchestrator = Orchestrator::new(
            Arc::new(TtlCache::new()),
            sources,
            OrchestratorConfig {
                tier_delay: Duration::ZERO,
            },
        )
        .unwrap();
        Dashboard::new(orchestrator)
    }

    #[tokio::test]
    async fn test_load_applies_both_tiers() {
        let dash = dashboard(Arc::new(AtomicU32::new(0)));

        dash.load().await;
        let view = dash.snapshot();

        assert_eq!(view.session_id(), 1);
        assert_eq!(view.settled_tiers(), &[Tier::Critical, Tier::Deferred]);
        assert_eq!(view.value("orders"), Some(&0));
        assert_eq!(view.slot("chat-status").unwrap().status(), SlotStatus::Error);
        assert_eq!(view.value_or("chat-status", 0), 0);
        assert_eq!(view.value("category-chart"), Some(&77));
    }

    #[tokio::test]
    async fn test_refresh_one_key() {
        let calls = Arc::new(AtomicU32::new(0));
        let dash = dashboard(calls.clone());

        dash.load().await;
        dash.load().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "second load is served from cache");

        dash.refresh(&["orders".to_string()]).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(dash.snapshot().value("orders"), Some(&1));
    }

    #[tokio::test]
    async fn test_refresh_empty_means_all() {
        let calls = Arc::new(AtomicU32::new(0));
        let dash = dashboard(calls.clone());

        dash.load().await;
        let session = dash.refresh(&[]).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.id, 2);
    }

    #[tokio::test]
    async fn test_refresh_unknown_key() {
        let dash = dashboard(Arc::new(AtomicU32::new(0)));
        assert!(dash.refresh(&["payroll".to_string()]).await.is_err());
    }
}
