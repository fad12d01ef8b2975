//! Retry wrapper for fetchers
//!
//! Exponential backoff lives in the fetcher, never in the orchestrator: a
//! wrapped fetcher only rejects once its attempts are used up.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use tracing::warn;

use crate::error::FetchError;
use crate::fetch::Fetcher;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }
}

/// Runs `f` until it succeeds or `max_retries` extra attempts have failed.
/// The last error is returned unchanged.
pub async fn retry<V, F, Fut>(config: &RetryConfig, mut f: F) -> Result<V, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<V, FetchError>>,
{
    let mut attempt = 0;
    let mut backoff = config.initial_backoff;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= config.max_retries => return Err(err),
            Err(err) => {
                attempt += 1;
                warn!(
                    "Retry attempt {}/{} after {}, waiting {:?}",
                    attempt, config.max_retries, err, backoff
                );
                tokio::time::sleep(backoff).await;

                backoff = Duration::from_millis(
                    (backoff.as_millis() as f64 * config.backoff_multiplier)
                        .min(config.max_backoff.as_millis() as f64) as u64,
                );
            }
        }
    }
}

/// Wraps `fetcher` so every invocation retries per `config`.
pub fn with_retry<V>(config: RetryConfig, fetcher: Fetcher<V>) -> Fetcher<V>
where
    V: Send + 'static,
{
    let config = Arc::new(config);
    Arc::new(move || {
        let config = config.clone();
        let fetcher = fetcher.clone();
        async move { retry(&config, || fetcher()).await }.boxed()
    })
}
