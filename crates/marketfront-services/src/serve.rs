//! Shared serving flow for the domain services.
//!
//! Every domain answers queries the same way: serve a fresh cache hit,
//! otherwise run the upstream fetch through the request coordinator, and
//! fall back to an expired cached value when the upstream fails in a way
//! that permits degraded service.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use marketfront_core::{CacheStore, FetchError, Lookup, RequestCoordinator};

/// A served value plus its freshness marker.
///
/// `stale: true` means the upstream failed and the payload is an expired
/// cached value, served so the caller gets data instead of an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Served<T> {
    pub data: T,
    pub stale: bool,
}

impl<T> Served<T> {
    pub fn fresh(data: T) -> Self {
        Self { data, stale: false }
    }

    pub fn stale(data: T) -> Self {
        Self { data, stale: true }
    }
}

/// Serve `key` from the cache, coordinating one upstream call across
/// concurrent callers on a miss.
///
/// Failure handling: `NotFound` always propagates, untouched by fallback.
/// Any other failure is answered with the expired cached value when one
/// exists, and propagated verbatim when the cache has nothing at all.
pub(crate) async fn serve_cached<T, F, Fut>(
    cache: &CacheStore<T>,
    coordinator: &RequestCoordinator<T>,
    key: &str,
    ttl: Duration,
    producer: F,
) -> Result<Served<T>, FetchError>
where
    T: Clone + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    let fallback = match cache.lookup(key).await {
        Lookup::Fresh(value) => {
            debug!(key, "serving fresh cache hit");
            return Ok(Served::fresh(value));
        }
        Lookup::Expired(value) => Some(value),
        Lookup::Absent => None,
    };

    match coordinator.fetch_once(key, producer).await {
        Ok(value) => {
            cache.set(key, value.clone(), ttl).await;
            Ok(Served::fresh(value))
        }
        Err(error) => match fallback {
            Some(value) if error.allows_stale_fallback() => {
                warn!(key, code = error.code(), "upstream failed; serving stale cache data");
                Ok(Served::stale(value))
            }
            _ => Err(error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fixtures() -> (CacheStore<u32>, RequestCoordinator<u32>) {
        (CacheStore::new(), RequestCoordinator::new())
    }

    #[tokio::test]
    async fn fresh_hit_skips_the_producer() {
        let (cache, coordinator) = fixtures();
        cache.set("k", 1, Duration::from_secs(60)).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let served = {
            let calls = Arc::clone(&calls);
            serve_cached(&cache, &coordinator, "k", Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .await
            .expect("served")
        };

        assert_eq!(served, Served::fresh(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn miss_fetches_and_populates() {
        let (cache, coordinator) = fixtures();

        let served = serve_cached(&cache, &coordinator, "k", Duration::from_secs(60), || async {
            Ok(9)
        })
        .await
        .expect("served");

        assert_eq!(served, Served::fresh(9));
        assert_eq!(cache.lookup("k").await, Lookup::Fresh(9));
    }

    #[tokio::test]
    async fn expired_value_is_served_stale_when_upstream_fails() {
        let (cache, coordinator) = fixtures();
        cache.set("k", 5, Duration::from_millis(5)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let served = serve_cached(&cache, &coordinator, "k", Duration::from_secs(60), || async {
            Err(FetchError::rate_limited("quota exhausted"))
        })
        .await
        .expect("stale fallback");

        assert_eq!(served, Served::stale(5));
    }

    #[tokio::test]
    async fn not_found_propagates_even_with_an_expired_value() {
        let (cache, coordinator) = fixtures();
        cache.set("k", 5, Duration::from_millis(5)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let error = serve_cached(&cache, &coordinator, "k", Duration::from_secs(60), || async {
            Err(FetchError::not_found("gone"))
        })
        .await
        .expect_err("must propagate");

        assert_eq!(error, FetchError::not_found("gone"));
    }

    #[tokio::test]
    async fn failure_with_empty_cache_propagates() {
        let (cache, coordinator) = fixtures();

        let error = serve_cached(&cache, &coordinator, "k", Duration::from_secs(60), || async {
            Err(FetchError::transient("upstream down"))
        })
        .await
        .expect_err("must propagate");

        assert_eq!(error, FetchError::transient("upstream down"));
    }
}
