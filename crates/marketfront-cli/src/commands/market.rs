use std::sync::Arc;

use serde_json::Value;

use marketfront_core::{AlphaVantageClient, MarketDataClient, ReqwestHttpClient};
use marketfront_services::MarketService;

use crate::config;
use crate::error::CliError;

pub async fn run() -> Result<Value, CliError> {
    let api_key = config::require_key(config::ALPHA_VANTAGE_KEY_VAR)?;
    let http = Arc::new(ReqwestHttpClient::new());
    let client: Arc<dyn MarketDataClient> = Arc::new(AlphaVantageClient::new(http, api_key));
    let service = MarketService::new(client);

    service
        .connect()
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;
    let outcome = service.snapshot().await;
    service.disconnect().await;

    Ok(serde_json::to_value(outcome?)?)
}
