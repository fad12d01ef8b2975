//! Dashboard Fetch - staged data fetching for dashboard pages
//!
//! Pulls a page's data from several independent upstreams through a
//! coalescing TTL cache, critical tier first, with per-source failure
//! isolation and an explicit refresh path.

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod models;
pub mod sources;
pub mod tasks;
pub mod view;

pub use api::AppState;
pub use cache::{CacheLookup, TtlCache};
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{DashboardError, FetchError};
pub use fetch::{FetchSource, Orchestrator, OrchestratorConfig, Tier, TierReport};
pub use tasks::{spawn_load, spawn_refresh};
pub use view::DashboardView;
