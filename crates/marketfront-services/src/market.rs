//! Market snapshot domain service.

use std::sync::Arc;

use marketfront_core::{
    cache_key, CacheStore, CoreError, DomainPolicy, FetchError, MarketDataClient, MarketSnapshot,
    RequestCoordinator,
};

use crate::serve::{serve_cached, Served};

/// Serves the real-time market snapshot with a seconds-scale TTL.
///
/// There is exactly one snapshot key, so every caller in a burst shares
/// the same in-flight upstream call.
pub struct MarketService {
    cache: CacheStore<MarketSnapshot>,
    coordinator: RequestCoordinator<MarketSnapshot>,
    client: Arc<dyn MarketDataClient>,
    policy: DomainPolicy,
}

impl MarketService {
    pub fn new(client: Arc<dyn MarketDataClient>) -> Self {
        Self::with_policy(client, DomainPolicy::market_default())
    }

    pub fn with_policy(client: Arc<dyn MarketDataClient>, policy: DomainPolicy) -> Self {
        Self {
            cache: CacheStore::new(),
            coordinator: RequestCoordinator::new(),
            client,
            policy,
        }
    }

    pub async fn connect(&self) -> Result<(), CoreError> {
        self.cache.connect().await
    }

    pub async fn disconnect(&self) {
        self.cache.disconnect().await;
    }

    pub async fn snapshot(&self) -> Result<Served<MarketSnapshot>, FetchError> {
        let key = cache_key("market", "snapshot");
        let client = Arc::clone(&self.client);
        serve_cached(
            &self.cache,
            &self.coordinator,
            &key,
            self.policy.cache_ttl,
            move || async move { client.snapshot().await },
        )
        .await
    }

    /// Drop the cached snapshot so the next query goes upstream.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&cache_key("market", "snapshot")).await;
    }

    /// Bound cache memory by dropping entries past the stale grace window.
    pub async fn sweep(&self) {
        self.cache.sweep(self.policy.stale_retention).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketfront_core::{FetchFuture, IndexQuote, Ticker, UtcTimestamp};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedMarket {
        calls: AtomicUsize,
        outcomes: std::sync::Mutex<Vec<Result<MarketSnapshot, FetchError>>>,
    }

    impl ScriptedMarket {
        fn new(outcomes: Vec<Result<MarketSnapshot, FetchError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcomes: std::sync::Mutex::new(outcomes.into_iter().rev().collect()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MarketDataClient for ScriptedMarket {
        fn snapshot(&self) -> FetchFuture<'_, MarketSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .outcomes
                .lock()
                .expect("outcome lock poisoned")
                .pop()
                .expect("unexpected extra upstream call");
            Box::pin(async move { outcome })
        }
    }

    fn snapshot_with_price(price: f64) -> MarketSnapshot {
        MarketSnapshot {
            quotes: vec![IndexQuote {
                symbol: Ticker::parse("SPY").expect("valid"),
                price,
                change_percent: None,
                volume: None,
            }],
            as_of: UtcTimestamp::now(),
        }
    }

    fn short_ttl_policy(ttl: Duration) -> DomainPolicy {
        DomainPolicy {
            cache_ttl: ttl,
            ..DomainPolicy::market_default()
        }
    }

    #[tokio::test]
    async fn second_query_within_ttl_is_served_from_cache() {
        let client = Arc::new(ScriptedMarket::new(vec![Ok(snapshot_with_price(100.0))]));
        let service = MarketService::new(Arc::clone(&client) as Arc<dyn MarketDataClient>);

        let first = service.snapshot().await.expect("first");
        let second = service.snapshot().await.expect("second");

        assert!(!first.stale);
        assert_eq!(first.data, second.data);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn expired_snapshot_is_refetched() {
        let client = Arc::new(ScriptedMarket::new(vec![
            Ok(snapshot_with_price(100.0)),
            Ok(snapshot_with_price(101.0)),
        ]));
        let service = MarketService::with_policy(
            Arc::clone(&client) as Arc<dyn MarketDataClient>,
            short_ttl_policy(Duration::from_millis(10)),
        );

        service.snapshot().await.expect("first");
        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = service.snapshot().await.expect("second");

        assert!(!second.stale);
        assert!((second.data.quotes[0].price - 101.0).abs() < 1e-9);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn rate_limited_refresh_serves_the_expired_snapshot_stale() {
        let client = Arc::new(ScriptedMarket::new(vec![
            Ok(snapshot_with_price(100.0)),
            Err(FetchError::rate_limited("quota exhausted")),
        ]));
        let service = MarketService::with_policy(
            Arc::clone(&client) as Arc<dyn MarketDataClient>,
            short_ttl_policy(Duration::from_millis(10)),
        );

        service.snapshot().await.expect("first");
        tokio::time::sleep(Duration::from_millis(30)).await;
        let degraded = service.snapshot().await.expect("stale fallback");

        assert!(degraded.stale);
        assert!((degraded.data.quotes[0].price - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn invalidate_forces_the_next_query_upstream() {
        let client = Arc::new(ScriptedMarket::new(vec![
            Ok(snapshot_with_price(100.0)),
            Ok(snapshot_with_price(102.0)),
        ]));
        let service = MarketService::new(Arc::clone(&client) as Arc<dyn MarketDataClient>);

        service.snapshot().await.expect("first");
        service.invalidate().await;
        service.snapshot().await.expect("second");

        assert_eq!(client.calls(), 2);
    }
}
