//! Session Tasks
//!
//! Runs dashboard sessions in the background so the caller can return as
//! soon as a session is started. Each task applies its tier reports into
//! the dashboard view as they settle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::dashboard::Dashboard;
use crate::error::Result;

/// A started background session.
#[derive(Debug)]
pub struct SpawnedSession {
    pub session_id: u64,
    pub handle: JoinHandle<()>,
}

/// Spawns a mount-style session (no invalidation).
///
/// The session is marked as the newest before this returns, so reports from
/// any older session still running are discarded from then on.
pub fn spawn_load<V>(dashboard: Arc<Dashboard<V>>) -> SpawnedSession
where
    V: Clone + Send + Sync + 'static,
{
    let session_id = dashboard.orchestrator().next_session_id();
    spawn_session(dashboard, session_id)
}

/// Invalidates `keys` (all when empty) and spawns the refresh session.
///
/// Unknown keys are rejected before anything is invalidated or spawned.
pub fn spawn_refresh<V>(dashboard: Arc<Dashboard<V>>, keys: &[String]) -> Result<SpawnedSession>
where
    V: Clone + Send + Sync + 'static,
{
    let session_id = dashboard.prepare_refresh(keys)?;
    Ok(spawn_session(dashboard, session_id))
}

fn spawn_session<V>(dashboard: Arc<Dashboard<V>>, session_id: u64) -> SpawnedSession
where
    V: Clone + Send + Sync + 'static,
{
    dashboard.begin(session_id);

    let handle = tokio::spawn(async move {
        let session = dashboard.run(session_id).await;
        let failures: usize = session.reports().iter().map(|r| r.failures()).sum();
        info!(
            "Session {} settled {} tiers with {} failed sources",
            session.id,
            session.reports().len(),
            failures
        );
    });

    SpawnedSession { session_id, handle }
}
