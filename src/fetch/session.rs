//! Fetch Sessions
//!
//! Per-run state machine and the per-tier reports delivered to the caller.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::FetchError;
use crate::fetch::Tier;

/// Outcome of every source of one tier, keyed by source key.
pub type TierResults<V> = BTreeMap<String, Result<V, FetchError>>;

// == Session State ==
/// Where a session is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "tier", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running(Tier),
    Settled(Tier),
    Complete,
}

// == Tier Report ==
/// One tier's settled results, delivered once per tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierReport<V> {
    pub session_id: u64,
    pub tier: Tier,
    pub results: TierResults<V>,
}

impl<V> TierReport<V> {
    /// Number of sources in this tier that rejected.
    pub fn failures(&self) -> usize {
        self.results.values().filter(|r| r.is_err()).count()
    }

    pub fn get(&self, key: &str) -> Option<&Result<V, FetchError>> {
        self.results.get(key)
    }
}

// == Tier Sink ==
/// Receives each tier's report as soon as the tier settles.
pub trait TierSink<V> {
    fn deliver(&mut self, report: TierReport<V>);
}

impl<V, F> TierSink<V> for F
where
    F: FnMut(TierReport<V>),
{
    fn deliver(&mut self, report: TierReport<V>) {
        self(report)
    }
}

/// Sink that discards reports, for callers that only want the returned session.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl<V> TierSink<V> for Discard {
    fn deliver(&mut self, _report: TierReport<V>) {}
}

// == Fetch Session ==
/// A finished run: its id, the states it passed through, and every report.
#[derive(Debug, Clone)]
pub struct FetchSession<V> {
    pub id: u64,
    state: SessionState,
    trail: Vec<SessionState>,
    reports: Vec<TierReport<V>>,
}

impl<V> FetchSession<V> {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            trail: vec![SessionState::Idle],
            reports: Vec::new(),
        }
    }

    pub(crate) fn transition(&mut self, next: SessionState) {
        tracing::debug!(session = self.id, from = ?self.state, to = ?next, "session transition");
        self.state = next;
        self.trail.push(next);
    }

    pub(crate) fn record(&mut self, report: TierReport<V>) {
        self.reports.push(report);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state visited, in order, starting with `Idle`.
    pub fn trail(&self) -> &[SessionState] {
        &self.trail
    }

    pub fn reports(&self) -> &[TierReport<V>] {
        &self.reports
    }

    pub fn report(&self, tier: Tier) -> Option<&TierReport<V>> {
        self.reports.iter().find(|r| r.tier == tier)
    }

    /// Looks a key up across all tiers.
    pub fn result(&self, key: &str) -> Option<&Result<V, FetchError>> {
        self.reports.iter().find_map(|r| r.get(key))
    }
}
