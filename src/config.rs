//! Configuration Module
//!
//! Loads server settings and the dashboard's source list from environment
//! variables.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::error::{DashboardError, Result};
use crate::fetch::{OrchestratorConfig, Tier};

/// One upstream JSON endpoint feeding the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub key: String,
    pub tier: Tier,
    pub ttl: Duration,
    pub url: String,
    /// Extra attempts before the source reports failure
    pub retries: u32,
}

impl SourceConfig {
    /// Parses `key|tier|ttl_secs|url[|retries]`.
    ///
    /// An empty `ttl_secs` falls back to `default_ttl`.
    pub fn parse(entry: &str, default_ttl: Duration) -> Result<Self> {
        let fields: Vec<&str> = entry.split('|').map(str::trim).collect();
        if !(4..=5).contains(&fields.len()) {
            return Err(DashboardError::InvalidConfig(format!(
                "source '{}' must look like key|tier|ttl_secs|url[|retries]",
                entry
            )));
        }

        let key = fields[0];
        if key.is_empty() {
            return Err(DashboardError::InvalidConfig(format!(
                "source '{}' has an empty key",
                entry
            )));
        }

        let tier = fields[1]
            .parse::<Tier>()
            .map_err(|e| DashboardError::InvalidConfig(format!("source '{}': {}", key, e)))?;

        let ttl = match fields[2] {
            "" => default_ttl,
            secs => secs.parse().map(Duration::from_secs).map_err(|_| {
                DashboardError::InvalidConfig(format!("source '{}': bad ttl '{}'", key, secs))
            })?,
        };

        let url = fields[3];
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DashboardError::InvalidConfig(format!(
                "source '{}': url must be http(s)",
                key
            )));
        }

        let retries = match fields.get(4) {
            None | Some(&"") => 0,
            Some(n) => n.parse().map_err(|_| {
                DashboardError::InvalidConfig(format!("source '{}': bad retries '{}'", key, n))
            })?,
        };

        Ok(Self {
            key: key.to_string(),
            tier,
            ttl,
            url: url.to_string(),
            retries,
        })
    }
}

/// Parses a `;`-separated source list, logging and skipping bad entries.
pub fn parse_sources(raw: &str, default_ttl: Duration) -> Vec<SourceConfig> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match SourceConfig::parse(entry, default_ttl) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("Skipping dashboard source: {}", e);
                None
            }
        })
        .collect()
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for sources that do not set one
    pub default_ttl: u64,
    /// Pause in milliseconds between delivering a tier and starting the next
    pub tier_delay_ms: u64,
    /// Upstream request timeout in seconds
    pub request_timeout: u64,
    /// Bearer token attached to upstream requests
    pub upstream_token: Option<String>,
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - Default source TTL in seconds (default: 60)
    /// - `TIER_DELAY_MS` - Inter-tier pause in milliseconds (default: 50)
    /// - `REQUEST_TIMEOUT` - Upstream timeout in seconds (default: 10)
    /// - `UPSTREAM_TOKEN` - Optional bearer token
    /// - `DASHBOARD_SOURCES` - `key|tier|ttl_secs|url[|retries]` entries separated by `;`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_ttl = env_parse("DEFAULT_TTL").unwrap_or(defaults.default_ttl);

        Self {
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            default_ttl,
            tier_delay_ms: env_parse("TIER_DELAY_MS").unwrap_or(defaults.tier_delay_ms),
            request_timeout: env_parse("REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            upstream_token: env::var("UPSTREAM_TOKEN").ok().filter(|t| !t.is_empty()),
            sources: env::var("DASHBOARD_SOURCES")
                .map(|raw| parse_sources(&raw, Duration::from_secs(default_ttl)))
                .unwrap_or_default(),
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            tier_delay: Duration::from_millis(self.tier_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: 60,
            tier_delay_ms: 50,
            request_timeout: 10,
            upstream_token: None,
            sources: Vec::new(),
        }
    }
}
