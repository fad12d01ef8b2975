//! Response DTOs for the dashboard API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::fetch::Tier;
use crate::view::{DashboardView, SlotStatus};

/// Response body for POST /dashboard/load and POST /dashboard/refresh
#[derive(Debug, Clone, Serialize)]
pub struct SessionStartedResponse {
    pub message: String,
    pub session_id: u64,
    /// Keys invalidated before the session started
    pub refreshed: Vec<String>,
}

impl SessionStartedResponse {
    pub fn new(session_id: u64, refreshed: Vec<String>) -> Self {
        Self {
            message: format!("Session {} started", session_id),
            session_id,
            refreshed,
        }
    }
}

/// One source as shown by GET /dashboard
#[derive(Debug, Clone, Serialize)]
pub struct SourceView {
    pub tier: Tier,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last good value, present when the current outcome is not a value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_fallback: Option<Value>,
}

/// Response body for GET /dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub session_id: u64,
    pub settled_tiers: Vec<Tier>,
    pub sources: BTreeMap<String, SourceView>,
    /// Current timestamp in ISO 8601 format
    pub generated_at: String,
}

impl DashboardResponse {
    pub fn from_view(view: &DashboardView<Value>) -> Self {
        let sources = view
            .slots()
            .map(|(key, slot)| {
                let (value, error) = match &slot.outcome {
                    Some(Ok(value)) => (Some(value.clone()), None),
                    Some(Err(err)) => (None, Some(err.to_string())),
                    None => (None, None),
                };
                let stale_fallback = match value {
                    Some(_) => None,
                    None => slot.last_good.clone(),
                };
                let source = SourceView {
                    tier: slot.tier,
                    status: slot.status(),
                    value,
                    error,
                    stale_fallback,
                };
                (key.to_string(), source)
            })
            .collect();

        Self {
            session_id: view.session_id(),
            settled_tiers: view.settled_tiers().to_vec(),
            sources,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub cache: CacheStats,
    pub in_flight: usize,
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, in_flight: usize) -> Self {
        let hit_rate = cache.hit_rate();
        Self {
            cache,
            in_flight,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
