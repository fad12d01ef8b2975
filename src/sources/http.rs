//! HTTP JSON fetchers
//!
//! Builds [`FetchSource`]s that GET a JSON endpoint with a shared client.

use std::time::Duration;

use futures::future::FutureExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::{DashboardError, FetchError, Result};
use crate::fetch::{FetchSource, Fetcher};
use crate::sources::retry::{with_retry, RetryConfig};

/// Builds the client shared by every source of a page.
///
/// When `token` is set it is sent as a bearer `Authorization` header.
pub fn build_client(timeout: Duration, token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| DashboardError::InvalidConfig(format!("upstream token: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| DashboardError::InvalidConfig(format!("http client: {}", e)))
}

/// GETs `url` and decodes the body as JSON.
pub async fn fetch_json(client: &Client, url: &str) -> std::result::Result<Value, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Source fetching `config.url`, retried `config.retries` times.
pub fn json_source(client: Client, config: &SourceConfig) -> FetchSource<Value> {
    let url = config.url.clone();
    let fetcher: Fetcher<Value> = std::sync::Arc::new(move || {
        let client = client.clone();
        let url = url.clone();
        async move { fetch_json(&client, &url).await }.boxed()
    });

    let fetcher = if config.retries > 0 {
        with_retry(RetryConfig::with_retries(config.retries), fetcher)
    } else {
        fetcher
    };

    FetchSource::from_fetcher(config.key.clone(), config.tier, config.ttl, fetcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Tier;

    #[test]
    fn test_build_client_with_token() {
        assert!(build_client(Duration::from_secs(5), Some("secret")).is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_token() {
        let result = build_client(Duration::from_secs(5), Some("bad\ntoken"));
        assert!(matches!(result, Err(DashboardError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let client = build_client(Duration::from_millis(500), None).unwrap();
        let source = json_source(
            client,
            &SourceConfig {
                key: "orders".into(),
                tier: Tier::Critical,
                ttl: Duration::from_secs(30),
                url: "http://127.0.0.1:9/orders".into(),
                retries: 0,
            },
        );

        assert_eq!(source.key, "orders");
        assert!(matches!(source.fetch().await, Err(FetchError::Transport(_))));
    }
}
