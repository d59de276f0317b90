//! Single-flight request coordination.
//!
//! Guarantees at most one in-flight upstream call per cache key at any
//! instant. Concurrent callers for the same key subscribe to the owning
//! flight and all observe the identical outcome, success or failure. The
//! producer runs on a detached task, so a subscriber that times out or is
//! cancelled never tears down the shared call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::FetchError;

type FlightTable<T> = Mutex<HashMap<String, broadcast::Sender<Result<T, FetchError>>>>;

/// Deduplicates concurrent fetches per cache key.
///
/// The flight table lock guards bookkeeping only; upstream I/O always
/// happens outside it, so a slow provider never blocks unrelated keys.
#[derive(Debug, Clone)]
pub struct RequestCoordinator<T> {
    flights: Arc<FlightTable<T>>,
}

impl<T: Clone + Send + 'static> Default for RequestCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> RequestCoordinator<T> {
    pub fn new() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `producer` at most once per key across all concurrent callers.
    ///
    /// The first caller for a key spawns the producer and every caller,
    /// first included, awaits the broadcast outcome. Joining callers never
    /// invoke the closure. Failures are delivered verbatim to all
    /// subscribers and are never retried here; retry belongs to the
    /// upstream client.
    pub async fn fetch_once<F, Fut>(&self, key: &str, producer: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let mut rx = {
            let mut flights = self
                .flights
                .lock()
                .expect("flight table lock is not poisoned");

            if let Some(tx) = flights.get(key) {
                debug!(key, "joining in-flight request");
                tx.subscribe()
            } else {
                let (tx, rx) = broadcast::channel(1);
                flights.insert(key.to_owned(), tx.clone());

                let flights_ref = Arc::clone(&self.flights);
                let key_owned = key.to_owned();
                let call = producer();
                tokio::spawn(async move {
                    let outcome = call.await;

                    // Deregister before broadcasting: every subscriber was
                    // registered under the table lock while the flight
                    // existed, and callers arriving after this point start
                    // a fresh flight instead of missing the result.
                    flights_ref
                        .lock()
                        .expect("flight table lock is not poisoned")
                        .remove(&key_owned);

                    if tx.send(outcome).is_err() {
                        // Every subscriber gave up waiting.
                        debug!(key = %key_owned, "in-flight result had no remaining subscribers");
                    }
                });

                rx
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(key, %error, "in-flight producer finished without a result");
                Err(FetchError::unknown(
                    "in-flight upstream call ended without producing a result",
                ))
            }
        }
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.flights
            .lock()
            .expect("flight table lock is not poisoned")
            .len()
    }
}

/// Build the canonical cache key for a domain query.
///
/// Callers must normalize parameters (ticker upper-casing) before this
/// point so identical logical queries always share one key.
pub fn cache_key(domain: &str, param: &str) -> String {
    format!("{domain}:{param}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_producer_invocation() {
        let coordinator: RequestCoordinator<u32> = RequestCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = coordinator.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                coordinator
                    .fetch_once("market:snapshot", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.expect("task completes");
            assert_eq!(result, Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failures_reach_every_subscriber_verbatim() {
        let coordinator: RequestCoordinator<u32> = RequestCoordinator::new();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .fetch_once("company:ZZZZ", || async {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Err(FetchError::not_found("no such ticker"))
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.expect("task completes");
            assert_eq!(result, Err(FetchError::not_found("no such ticker")));
        }
    }

    #[tokio::test]
    async fn sequential_calls_each_run_the_producer() {
        let coordinator: RequestCoordinator<u32> = RequestCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for expected in 1..=3 {
            let calls = Arc::clone(&calls);
            let value = coordinator
                .fetch_once("k", move || async move {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) as u32)
                })
                .await
                .expect("producer succeeds");
            assert_eq!(value as usize + 1, expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancelled_subscriber_does_not_cancel_the_flight() {
        let coordinator: RequestCoordinator<u32> = RequestCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        // First caller owns the flight, then gets aborted mid-wait.
        let owner = {
            let coordinator = coordinator.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                coordinator
                    .fetch_once("k", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(80)).await;
                        Ok(7)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let joiner = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.fetch_once("k", || async { Ok(0) }).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        owner.abort();

        // The surviving subscriber still receives the shared result, and
        // the producer ran exactly once.
        let result = joiner.await.expect("joiner completes");
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_fly_independently() {
        let coordinator: RequestCoordinator<&'static str> = RequestCoordinator::new();

        let a = coordinator.fetch_once("company:AAPL", || async { Ok("aapl") });
        let b = coordinator.fetch_once("company:MSFT", || async { Ok("msft") });
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a, Ok("aapl"));
        assert_eq!(b, Ok("msft"));
    }

    #[test]
    fn cache_key_is_deterministic() {
        assert_eq!(cache_key("company", "AAPL"), "company:AAPL");
        assert_eq!(cache_key("market", "snapshot"), "market:snapshot");
    }
}
