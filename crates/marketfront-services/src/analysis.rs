//! Analysis domain service.
//!
//! Analysis is the only domain backed by a durable store as well as the
//! cache: a persisted report fresh enough by policy is served without
//! recomputation, and every newly computed report is written back. Store
//! availability never blocks serving; a failed read falls through to
//! recomputation and a failed write is logged and swallowed.

use std::sync::Arc;

use tracing::{debug, warn};

use marketfront_core::{
    cache_key, AnalysisClient, AnalysisPolicy, AnalysisRecord, AnalysisReport, AnalysisStore,
    CacheStore, CoreError, FetchError, Lookup, RequestCoordinator, Ticker,
};

use crate::serve::Served;

pub struct AnalysisService {
    cache: CacheStore<AnalysisReport>,
    coordinator: RequestCoordinator<AnalysisReport>,
    client: Arc<dyn AnalysisClient>,
    store: Arc<dyn AnalysisStore>,
    policy: AnalysisPolicy,
}

impl AnalysisService {
    pub fn new(client: Arc<dyn AnalysisClient>, store: Arc<dyn AnalysisStore>) -> Self {
        Self::with_policy(client, store, AnalysisPolicy::default())
    }

    pub fn with_policy(
        client: Arc<dyn AnalysisClient>,
        store: Arc<dyn AnalysisStore>,
        policy: AnalysisPolicy,
    ) -> Self {
        Self {
            cache: CacheStore::new(),
            coordinator: RequestCoordinator::new(),
            client,
            store,
            policy,
        }
    }

    pub async fn connect(&self) -> Result<(), CoreError> {
        self.cache.connect().await
    }

    pub async fn disconnect(&self) {
        self.cache.disconnect().await;
    }

    /// Serve the analysis report for `ticker`.
    ///
    /// Resolution order: fresh cache entry, then a persisted record still
    /// inside the freshness window, then a coordinated recomputation. An
    /// upstream failure degrades to an expired cached report when one
    /// exists, except for `NotFound`.
    pub async fn report(&self, ticker: &Ticker) -> Result<Served<AnalysisReport>, FetchError> {
        let key = cache_key("analysis", ticker.as_str());

        let fallback = match self.cache.lookup(&key).await {
            Lookup::Fresh(report) => {
                debug!(%ticker, "serving fresh cached analysis");
                return Ok(Served::fresh(report));
            }
            Lookup::Expired(report) => Some(report),
            Lookup::Absent => None,
        };

        if let Some(report) = self.read_persisted(ticker).await {
            self.cache
                .set(&key, report.clone(), self.policy.domain.cache_ttl)
                .await;
            return Ok(Served::fresh(report));
        }

        let client = Arc::clone(&self.client);
        let store = Arc::clone(&self.store);
        let ticker_owned = ticker.clone();
        let outcome = self
            .coordinator
            .fetch_once(&key, move || async move {
                let report = client.analyze(&ticker_owned).await?;

                // Write-back happens inside the coordinated producer so a
                // burst of callers persists the report exactly once.
                let record = AnalysisRecord::from_report(report.clone());
                if let Err(error) = store.write(&record).await {
                    warn!(
                        ticker = %record.ticker,
                        %error,
                        "analysis store write failed; serving unpersisted report"
                    );
                }
                Ok(report)
            })
            .await;

        match outcome {
            Ok(report) => {
                self.cache
                    .set(&key, report.clone(), self.policy.domain.cache_ttl)
                    .await;
                Ok(Served::fresh(report))
            }
            Err(error) => match fallback {
                Some(report) if error.allows_stale_fallback() => {
                    warn!(
                        %ticker,
                        code = error.code(),
                        "analysis upstream failed; serving stale cached report"
                    );
                    Ok(Served::stale(report))
                }
                _ => Err(error),
            },
        }
    }

    pub async fn invalidate(&self, ticker: &Ticker) {
        self.cache
            .invalidate(&cache_key("analysis", ticker.as_str()))
            .await;
    }

    pub async fn sweep(&self) {
        self.cache.sweep(self.policy.domain.stale_retention).await;
    }

    /// Persisted record, if present and inside the freshness window. Read
    /// failures degrade to recomputation rather than failing the query.
    async fn read_persisted(&self, ticker: &Ticker) -> Option<AnalysisReport> {
        match self.store.read(ticker).await {
            Ok(Some(record)) if record.computed_at.age() <= self.policy.store_freshness => {
                debug!(%ticker, "serving persisted analysis record");
                Some(record.report)
            }
            Ok(Some(_)) => {
                debug!(%ticker, "persisted analysis record too old; recomputing");
                None
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%ticker, %error, "analysis store read failed; recomputing");
                None
            }
        }
    }
}
