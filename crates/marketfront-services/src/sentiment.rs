//! Market sentiment domain service.

use std::sync::Arc;

use marketfront_core::{
    cache_key, CacheStore, CoreError, DomainPolicy, FetchError, RequestCoordinator,
    SentimentClient, SentimentSummary,
};

use crate::serve::{serve_cached, Served};

/// Serves the market-wide news sentiment summary.
pub struct SentimentService {
    cache: CacheStore<SentimentSummary>,
    coordinator: RequestCoordinator<SentimentSummary>,
    client: Arc<dyn SentimentClient>,
    policy: DomainPolicy,
}

impl SentimentService {
    pub fn new(client: Arc<dyn SentimentClient>) -> Self {
        Self::with_policy(client, DomainPolicy::sentiment_default())
    }

    pub fn with_policy(client: Arc<dyn SentimentClient>, policy: DomainPolicy) -> Self {
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

    pub async fn market_sentiment(&self) -> Result<Served<SentimentSummary>, FetchError> {
        let key = cache_key("sentiment", "market");
        let client = Arc::clone(&self.client);
        serve_cached(
            &self.cache,
            &self.coordinator,
            &key,
            self.policy.cache_ttl,
            move || async move { client.market_sentiment().await },
        )
        .await
    }

    pub async fn invalidate(&self) {
        self.cache
            .invalidate(&cache_key("sentiment", "market"))
            .await;
    }

    pub async fn sweep(&self) {
        self.cache.sweep(self.policy.stale_retention).await;
    }
}
