//! Error types for the dashboard fetcher
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error Enum ==
/// Failure of a single fetch source.
///
/// Cloneable because one failed flight is handed to every caller that
/// joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// Response body could not be decoded into the expected shape
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Any other fetcher-defined failure
    #[error("Fetch failed: {0}")]
    Failed(String),
}

impl FetchError {
    /// Shorthand for [`FetchError::Failed`].
    pub fn failed(msg: impl Into<String>) -> Self {
        FetchError::Failed(msg.into())
    }
}

// == Dashboard Error Enum ==
/// Caller and configuration errors.
///
/// Per-source failures never surface here; they stay inside the session's
/// result map as [`FetchError`].
#[derive(Error, Debug)]
pub enum DashboardError {
    /// No fetch sources were registered
    #[error("No fetch sources registered")]
    NoSources,

    /// Two sources share one cache key
    #[error("Duplicate source key: {0}")]
    DuplicateKey(String),

    /// A refresh named a key no source populates
    #[error("Unknown source key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::UnknownKey(_) | DashboardError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::NoSources
            | DashboardError::DuplicateKey(_)
            | DashboardError::InvalidConfig(_)
            | DashboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the dashboard fetcher.
pub type Result<T> = std::result::Result<T, DashboardError>;
