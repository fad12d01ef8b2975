//! View State
//!
//! Caller-side state that tier reports are applied into. Tracks the newest
//! session so late reports from an abandoned session are dropped, and keeps
//! the last good value per key for fallback rendering.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::{FetchSource, Tier, TierReport};

// == Slot ==
/// Per-key view state.
#[derive(Debug, Clone)]
pub struct Slot<V> {
    pub tier: Tier,
    /// Outcome in the newest session, `None` while still pending
    pub outcome: Option<Result<V, FetchError>>,
    /// Most recent successful value from any session
    pub last_good: Option<V>,
}

impl<V> Slot<V> {
    fn pending(tier: Tier) -> Self {
        Self {
            tier,
            outcome: None,
            last_good: None,
        }
    }

    pub fn status(&self) -> SlotStatus {
        match &self.outcome {
            None => SlotStatus::Pending,
            Some(Ok(_)) => SlotStatus::Ok,
            Some(Err(_)) => SlotStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Pending,
    Ok,
    Error,
}

// == Dashboard View ==
#[derive(Debug, Clone)]
pub struct DashboardView<V> {
    session_id: u64,
    settled: Vec<Tier>,
    slots: BTreeMap<String, Slot<V>>,
}

impl<V> Default for DashboardView<V> {
    fn default() -> Self {
        Self {
            session_id: 0,
            settled: Vec::new(),
            slots: BTreeMap::new(),
        }
    }
}

impl<V: Clone> DashboardView<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// View with a pending slot for every source.
    pub fn for_sources(sources: &[FetchSource<V>]) -> Self {
        let slots = sources
            .iter()
            .map(|s| (s.key.clone(), Slot::pending(s.tier)))
            .collect();
        Self {
            slots,
            ..Self::default()
        }
    }

    /// Newest session begun or applied.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Tiers of the newest session delivered so far.
    pub fn settled_tiers(&self) -> &[Tier] {
        &self.settled
    }

    // == Begin ==
    /// Marks `session_id` as the newest session.
    ///
    /// Current outcomes go back to pending; last good values are kept.
    /// Returns false when a newer session has already begun.
    pub fn begin(&mut self, session_id: u64) -> bool {
        if session_id <= self.session_id {
            return session_id == self.session_id;
        }
        self.session_id = session_id;
        self.settled.clear();
        for slot in self.slots.values_mut() {
            slot.outcome = None;
        }
        true
    }

    // == Apply ==
    /// Applies one tier report. Reports older than the newest session are ignored.
    pub fn apply(&mut self, report: TierReport<V>) -> bool {
        if report.session_id < self.session_id {
            debug!(
                report = report.session_id,
                current = self.session_id,
                tier = %report.tier,
                "discarding report from superseded session"
            );
            return false;
        }
        self.begin(report.session_id);

        for (key, result) in report.results {
            let slot = self
                .slots
                .entry(key)
                .or_insert_with(|| Slot::pending(report.tier));
            slot.tier = report.tier;
            if let Ok(value) = &result {
                slot.last_good = Some(value.clone());
            }
            slot.outcome = Some(result);
        }
        if !self.settled.contains(&report.tier) {
            self.settled.push(report.tier);
        }
        true
    }

    pub fn slot(&self, key: &str) -> Option<&Slot<V>> {
        self.slots.get(key)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, &Slot<V>)> {
        self.slots.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// Value from the newest session, if that source succeeded.
    pub fn value(&self, key: &str) -> Option<&V> {
        match self.slots.get(key)?.outcome.as_ref()? {
            Ok(value) => Some(value),
            Err(_) => None,
        }
    }

    /// Current value, else the last good one, else `default`.
    pub fn value_or(&self, key: &str, default: V) -> V {
        self.value(key)
            .or_else(|| self.slots.get(key).and_then(|s| s.last_good.as_ref()))
            .cloned()
            .unwrap_or(default)
    }
}
