//! Timeout and bounded retry around document store calls.
//!
//! Only transient failures (`Unavailable`, `Timeout`) are retried. Rule violations such as
//! swipe conflicts surface on the first attempt. Backoff doubles per attempt with up to
//! half again added as jitter, so writers contending on one job spread out.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::error::MarketplaceError;
use super::store::StoreError;
use crate::config::StoreConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

/// `backoff` plus a random extra of at most half of it.
fn jittered(backoff: Duration) -> Duration {
    let base_ms = backoff.as_millis() as u64;
    let jitter_ms = rand::rng().random_range(0..=base_ms / 2);
    Duration::from_millis(base_ms + jitter_ms)
}

/// Run `attempt` until it succeeds, fails permanently, or the attempt budget is spent.
pub(crate) async fn run<T, Fut, F>(
    policy: RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, MarketplaceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MarketplaceError>>,
{
    let mut backoff = policy.initial_backoff;
    let mut tries = 0;

    loop {
        tries += 1;
        let result = match tokio::time::timeout(policy.timeout, attempt()).await {
            Ok(result) => result,
            Err(_) => Err(MarketplaceError::Transient(StoreError::Timeout(
                policy.timeout,
            ))),
        };

        match result {
            Err(error) if error.is_transient() && tries < policy.max_attempts => {
                let wait = jittered(backoff);
                warn!(
                    operation,
                    attempt = tries,
                    backoff_ms = wait.as_millis() as u64,
                    %error,
                    "transient store failure, retrying"
                );
                tokio::time::sleep(wait).await;
                backoff = (backoff * 2).min(policy.max_backoff);
            }
            Err(error) => {
                debug!(operation, attempts = tries, %error, "store call failed");
                return Err(error);
            }
            Ok(value) => return Ok(value),
        }
    }
}
