use std::sync::Arc;

use serde_json::Value;

use marketfront_core::{NewsApiClient, ReqwestHttpClient, SentimentClient};
use marketfront_services::SentimentService;

use crate::config;
use crate::error::CliError;

pub async fn run() -> Result<Value, CliError> {
    let api_key = config::require_key(config::NEWS_API_KEY_VAR)?;
    let http = Arc::new(ReqwestHttpClient::new());
    let client: Arc<dyn SentimentClient> = Arc::new(NewsApiClient::new(http, api_key));
    let service = SentimentService::new(client);

    service
        .connect()
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;
    let outcome = service.market_sentiment().await;
    service.disconnect().await;

    Ok(serde_json::to_value(outcome?)?)
}
