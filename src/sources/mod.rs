//! Sources Module
//!
//! Fetcher implementations plugged into the orchestrator: HTTP JSON
//! endpoints and a retrying wrapper.

pub mod http;
pub mod retry;

pub use http::{build_client, fetch_json, json_source};
pub use retry::{retry, with_retry, RetryConfig};
