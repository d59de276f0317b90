//! Retry with exponential backoff and jitter for transient upstream failures.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::FetchError;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Fixed delay between retries.
    Fixed { delay: Duration },
    /// Exponential delay: `base * (factor ^ attempt)`, capped at `max`,
    /// optionally jittered by +/- 50%.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped = Duration::from_secs_f64(seconds.min(max.as_secs_f64()));

                if jitter {
                    let jitter_ms = (capped.as_millis() as f64 * 0.5) as u64;
                    let offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        capped.as_millis() as i64 + (offset as i64 - jitter_ms as i64);
                    Duration::from_millis(total_ms.max(0) as u64)
                } else {
                    capped
                }
            }
        }
    }
}

/// Bounded-retry configuration for one upstream client.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retries; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            backoff: Backoff::default(),
        }
    }
}

/// Run `producer` until it succeeds, returns a non-retryable failure, or
/// retries are exhausted.
///
/// Only failures whose [`FetchError::retryable`] bit is set are retried;
/// `RateLimited`, `NotFound`, and `Unauthorized` fail fast so the caller
/// can degrade or surface them immediately. The final transient failure is
/// returned verbatim once the budget is spent.
pub async fn fetch_with_retry<T, F, Fut>(
    config: &RetryConfig,
    mut producer: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        match producer().await {
            Ok(value) => return Ok(value),
            Err(error) if error.retryable() && attempt < config.max_retries => {
                let delay = config.backoff.delay(attempt);
                debug!(
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient upstream failure; backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
