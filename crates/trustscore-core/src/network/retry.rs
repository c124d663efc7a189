//! Retry logic with exponential backoff and jitter.
//!
//! Collaborator calls are retried only for transient failures (see
//! [`TrustScoreError::is_retryable`]); a 404 or malformed payload fails
//! immediately so the owning judgment function can fall back without delay.

use crate::config::NetworkConfig;
use crate::error::{Result, TrustScoreError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: NetworkConfig::MAX_RETRIES,
            base_delay: NetworkConfig::RETRY_BASE_DELAY,
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (0-indexed): `base * 2^attempt`,
    /// capped, then scaled by a factor in `[0.5, 1.5)` when jitter is on.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let doubled = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        let capped = doubled.min(self.max_delay.as_secs_f64());

        let secs = if self.jitter {
            let factor = rand::rng().random_range(0.5..1.5);
            (capped * factor).min(self.max_delay.as_secs_f64())
        } else {
            capped
        };

        Duration::from_secs_f64(secs)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts `config.max_attempts`.
///
/// `label` identifies the call in log output.
pub async fn retry_async<F, Fut, T>(config: &RetryConfig, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} attempts", label, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt + 1 >= config.max_attempts => {
                warn!("{}: all {} attempts failed, last error: {}", label, config.max_attempts, e);
                return Err(e);
            }
            Err(e) => {
                let delay = match &e {
                    TrustScoreError::RateLimited {
                        retry_after_secs: Some(secs),
                        ..
                    } => Duration::from_secs(*secs).min(config.max_delay),
                    _ => config.calculate_delay(attempt),
                };
                warn!(
                    "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                    label,
                    attempt + 1,
                    config.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
