use crate::config::Config;
use crate::error::NavigationError;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Constant-delay retry budget for page navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_retries,
            delay: config.retry_delay(),
        }
    }
}

/// Run `action` until it succeeds or the policy's attempts are spent.
/// Every failed attempt but the last is logged and followed by the same
/// fixed delay.
pub async fn advance<T, F, Fut>(
    target: &str,
    policy: RetryPolicy,
    mut action: F,
) -> Result<T, NavigationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match action().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(url = target, attempt, "navigation recovered");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    url = target,
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    "navigation failed, retrying: {:#}",
                    e
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                return Err(NavigationError {
                    target: target.to_string(),
                    attempts: attempt,
                    source: e.into(),
                });
            }
        }
    }
}
