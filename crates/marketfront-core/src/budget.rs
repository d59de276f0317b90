//! Local per-provider rate budget.
//!
//! Free-tier providers throttle hard; checking a local quota before the
//! network call lets a `RateLimited` failure surface immediately so the
//! caller can serve stale cache data instead of blocking on a doomed call.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Governor-backed request budget over a rolling window.
#[derive(Clone)]
pub struct RateBudget {
    limiter: Arc<DirectRateLimiter>,
}

impl RateBudget {
    /// Budget of `limit` requests per `window`.
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, limit))),
        }
    }

    /// Try to spend one unit of budget. `Err(())` means the quota is
    /// currently exhausted and the call should not go out.
    pub fn try_acquire(&self) -> Result<(), ()> {
        self.limiter.check().map_err(|_| ())
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let safe_limit = limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_after_burst_is_spent() {
        let budget = RateBudget::new(Duration::from_secs(60), 2);

        assert!(budget.try_acquire().is_ok());
        assert!(budget.try_acquire().is_ok());
        assert!(budget.try_acquire().is_err());
    }

    #[test]
    fn zero_limit_is_clamped_to_one() {
        let budget = RateBudget::new(Duration::from_secs(60), 0);
        assert!(budget.try_acquire().is_ok());
        assert!(budget.try_acquire().is_err());
    }
}
