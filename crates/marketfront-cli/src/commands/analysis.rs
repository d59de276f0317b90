use std::sync::Arc;

use serde_json::Value;

use marketfront_core::{AnalysisClient, AnalysisStore, FinnhubClient, ReqwestHttpClient, Ticker};
use marketfront_services::AnalysisService;
use marketfront_store::DuckDbAnalysisStore;

use crate::config;
use crate::error::CliError;

pub async fn run(raw_ticker: &str) -> Result<Value, CliError> {
    let ticker = Ticker::parse(raw_ticker)?;

    let api_key = config::require_key(config::FINNHUB_KEY_VAR)?;
    let http = Arc::new(ReqwestHttpClient::new());
    let client: Arc<dyn AnalysisClient> = Arc::new(FinnhubClient::new(http, api_key));
    let store: Arc<dyn AnalysisStore> = Arc::new(DuckDbAnalysisStore::open(config::db_path())?);
    let service = AnalysisService::new(client, store);

    service
        .connect()
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;
    let outcome = service.report(&ticker).await;
    service.disconnect().await;

    Ok(serde_json::to_value(outcome?)?)
}
