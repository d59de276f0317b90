//! Company profile domain service.

use std::sync::Arc;

use marketfront_core::{
    cache_key, CacheStore, CompanyClient, CompanyProfile, CoreError, DomainPolicy, FetchError,
    RequestCoordinator, Ticker,
};

use crate::serve::{serve_cached, Served};

/// Serves company fundamentals keyed per ticker.
///
/// Keys are built from the normalized ticker, so `aapl` and `AAPL` land
/// on the same cache slot and the same in-flight call.
pub struct CompanyService {
    cache: CacheStore<CompanyProfile>,
    coordinator: RequestCoordinator<CompanyProfile>,
    client: Arc<dyn CompanyClient>,
    policy: DomainPolicy,
}

impl CompanyService {
    pub fn new(client: Arc<dyn CompanyClient>) -> Self {
        Self::with_policy(client, DomainPolicy::company_default())
    }

    pub fn with_policy(client: Arc<dyn CompanyClient>, policy: DomainPolicy) -> Self {
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

    pub async fn profile(&self, ticker: &Ticker) -> Result<Served<CompanyProfile>, FetchError> {
        let key = cache_key("company", ticker.as_str());
        let client = Arc::clone(&self.client);
        let ticker = ticker.clone();
        serve_cached(
            &self.cache,
            &self.coordinator,
            &key,
            self.policy.cache_ttl,
            move || async move { client.profile(&ticker).await },
        )
        .await
    }

    pub async fn invalidate(&self, ticker: &Ticker) {
        self.cache
            .invalidate(&cache_key("company", ticker.as_str()))
            .await;
    }

    pub async fn sweep(&self) {
        self.cache.sweep(self.policy.stale_retention).await;
    }
}
