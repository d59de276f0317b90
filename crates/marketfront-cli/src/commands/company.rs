use std::sync::Arc;

use serde_json::Value;

use marketfront_core::{CompanyClient, FinnhubClient, ReqwestHttpClient, Ticker};
use marketfront_services::CompanyService;

use crate::config;
use crate::error::CliError;

pub async fn run(raw_ticker: &str) -> Result<Value, CliError> {
    let ticker = Ticker::parse(raw_ticker)?;

    let api_key = config::require_key(config::FINNHUB_KEY_VAR)?;
    let http = Arc::new(ReqwestHttpClient::new());
    let client: Arc<dyn CompanyClient> = Arc::new(FinnhubClient::new(http, api_key));
    let service = CompanyService::new(client);

    service
        .connect()
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;
    let outcome = service.profile(&ticker).await;
    service.disconnect().await;

    Ok(serde_json::to_value(outcome?)?)
}
