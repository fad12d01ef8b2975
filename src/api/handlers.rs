//! API Handlers
//!
//! HTTP request handlers for each dashboard endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::error::{DashboardError, Result};
use crate::models::{
    DashboardResponse, HealthResponse, RefreshRequest, SessionStartedResponse, StatsResponse,
};
use crate::tasks::{spawn_load, spawn_refresh};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The page served by this process
    pub dashboard: Arc<Dashboard<Value>>,
}

impl AppState {
    /// Creates a new AppState around an already built dashboard.
    pub fn new(dashboard: Dashboard<Value>) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds one HTTP JSON source per configured upstream, all sharing one
    /// client and one cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        use crate::cache::TtlCache;
        use crate::fetch::Orchestrator;
        use crate::sources::{build_client, json_source};

        let client = build_client(config.request_timeout(), config.upstream_token.as_deref())?;
        let sources = config
            .sources
            .iter()
            .map(|source| json_source(client.clone(), source))
            .collect();

        let orchestrator = Orchestrator::new(
            Arc::new(TtlCache::new()),
            sources,
            config.orchestrator(),
        )?;
        Ok(Self::new(Dashboard::new(orchestrator)))
    }
}

/// Handler for POST /dashboard/load
///
/// Starts a session that uses cached values where they are still fresh.
pub async fn load_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionStartedResponse>) {
    let spawned = spawn_load(state.dashboard.clone());

    (
        StatusCode::ACCEPTED,
        Json(SessionStartedResponse::new(spawned.session_id, Vec::new())),
    )
}

/// Handler for POST /dashboard/refresh
///
/// Invalidates the requested keys (all keys without a body) and starts a session.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionStartedResponse>)> {
    let req = parse_refresh_body(&headers, &body)?;
    if let Some(error_msg) = req.validate() {
        return Err(DashboardError::InvalidRequest(error_msg));
    }

    let spawned = spawn_refresh(state.dashboard.clone(), &req.keys)?;
    let refreshed = if req.keys.is_empty() {
        state.dashboard.orchestrator().keys()
    } else {
        req.keys
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(SessionStartedResponse::new(spawned.session_id, refreshed)),
    ))
}

/// Reads a refresh body. Only an empty body means "every source"; anything
/// else must be a JSON `RefreshRequest`.
fn parse_refresh_body(headers: &HeaderMap, body: &[u8]) -> Result<RefreshRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RefreshRequest::default());
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if !is_json {
        return Err(DashboardError::InvalidRequest(
            "Expected Content-Type: application/json".to_string(),
        ));
    }

    Json::<RefreshRequest>::from_bytes(body)
        .map(|Json(req)| req)
        .map_err(|rejection| DashboardError::InvalidRequest(rejection.body_text()))
}

/// Handler for GET /dashboard
///
/// Returns whatever the newest session has delivered so far.
pub async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardResponse> {
    let view = state.dashboard.snapshot();
    Json(DashboardResponse::from_view(&view))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.dashboard.orchestrator().cache();
    Json(StatsResponse::new(cache.stats(), cache.in_flight()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
