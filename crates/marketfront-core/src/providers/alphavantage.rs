//! Alpha Vantage adapter: real-time market snapshot over tracked indices.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http::{HttpAuth, HttpClient, HttpRequest};
use crate::policy::{DomainPolicy, QuotaPolicy};
use crate::retry::fetch_with_retry;
use crate::upstream::{classify_status, FetchFuture, MarketDataClient, ProviderId};
use crate::{
    FetchError, IndexQuote, MarketSnapshot, RateBudget, RetryConfig, Ticker, UtcTimestamp,
};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Market-data client backed by the Alpha Vantage `GLOBAL_QUOTE` endpoint.
///
/// A snapshot is assembled from one quote per tracked symbol (broad index
/// ETF proxies by default).
pub struct AlphaVantageClient {
    http: Arc<dyn HttpClient>,
    auth: HttpAuth,
    tracked: Vec<Ticker>,
    budget: RateBudget,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl AlphaVantageClient {
    pub fn new(http: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let policy = DomainPolicy::market_default();
        let quota = QuotaPolicy::alphavantage_default();
        Self {
            http,
            auth: HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: api_key.into(),
            },
            tracked: default_tracked_symbols(),
            budget: RateBudget::new(quota.window, quota.limit),
            retry: policy.retry,
            timeout_ms: policy.request_timeout.as_millis() as u64,
        }
    }

    pub fn with_tracked_symbols(mut self, tracked: Vec<Ticker>) -> Self {
        self.tracked = tracked;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_quote(&self, symbol: &Ticker) -> Result<IndexQuote, FetchError> {
        if self.budget.try_acquire().is_err() {
            return Err(FetchError::rate_limited(
                "alphavantage local quota exhausted; skipping upstream call",
            ));
        }

        let url = format!("{BASE_URL}?function=GLOBAL_QUOTE&symbol={}", symbol.as_str());
        let body = fetch_with_retry(&self.retry, || {
            let request = HttpRequest::get(url.clone())
                .with_auth(&self.auth)
                .with_timeout_ms(self.timeout_ms);
            let http = Arc::clone(&self.http);
            async move {
                let response = http.execute(request).await.map_err(|error| {
                    if error.retryable() {
                        FetchError::transient(format!(
                            "alphavantage transport error: {}",
                            error.message()
                        ))
                    } else {
                        FetchError::unknown(format!(
                            "alphavantage transport error: {}",
                            error.message()
                        ))
                    }
                })?;

                if !response.is_success() {
                    return Err(classify_status(ProviderId::AlphaVantage, response.status));
                }
                Ok(response.body)
            }
        })
        .await?;

        parse_global_quote(&body, symbol)
    }
}

impl MarketDataClient for AlphaVantageClient {
    fn snapshot(&self) -> FetchFuture<'_, MarketSnapshot> {
        Box::pin(async move {
            let mut quotes = Vec::with_capacity(self.tracked.len());
            for symbol in &self.tracked {
                quotes.push(self.fetch_quote(symbol).await?);
            }
            debug!(quotes = quotes.len(), "market snapshot assembled");
            Ok(MarketSnapshot {
                quotes,
                as_of: UtcTimestamp::now(),
            })
        })
    }
}

fn default_tracked_symbols() -> Vec<Ticker> {
    ["SPY", "QQQ", "DIA"]
        .iter()
        .filter_map(|raw| Ticker::parse(raw).ok())
        .collect()
}

/// Alpha Vantage signals quota exhaustion and bad symbols inside a 200
/// response body, so classification has to look past the status line.
fn parse_global_quote(body: &str, symbol: &Ticker) -> Result<IndexQuote, FetchError> {
    let payload: GlobalQuoteEnvelope = serde_json::from_str(body).map_err(|e| {
        FetchError::unknown(format!("failed to decode alphavantage response: {e}"))
    })?;

    if payload.note.is_some() || payload.information.is_some() {
        return Err(FetchError::rate_limited(
            "alphavantage signalled quota exhaustion in the response body",
        ));
    }
    if let Some(message) = payload.error_message {
        return Err(FetchError::not_found(format!(
            "alphavantage rejected the query: {message}"
        )));
    }

    let quote = payload
        .quote
        .filter(|q| !q.price.is_empty())
        .ok_or_else(|| {
            FetchError::not_found(format!("no quote data for '{}'", symbol.as_str()))
        })?;

    let price = quote
        .price
        .parse::<f64>()
        .map_err(|_| FetchError::unknown(format!("unparseable price '{}'", quote.price)))?;
    let change_percent = quote
        .change_percent
        .as_deref()
        .and_then(|raw| raw.trim_end_matches('%').parse::<f64>().ok());
    let volume = quote.volume.as_deref().and_then(|raw| raw.parse::<u64>().ok());

    Ok(IndexQuote {
        symbol: symbol.clone(),
        price,
        change_percent,
        volume,
    })
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote")]
    quote: Option<GlobalQuotePayload>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuotePayload {
    #[serde(rename = "05. price", default)]
    price: String,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;

    struct CannedHttp {
        status: u16,
        body: &'static str,
    }

    impl HttpClient for CannedHttp {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let response = HttpResponse {
                status: self.status,
                body: self.body.to_owned(),
            };
            Box::pin(async move { Ok(response) })
        }
    }

    fn client_with(status: u16, body: &'static str) -> AlphaVantageClient {
        AlphaVantageClient::new(Arc::new(CannedHttp { status, body }), "demo")
            .with_tracked_symbols(vec![Ticker::parse("SPY").expect("valid")])
            .with_retry(RetryConfig::no_retry())
    }

    #[tokio::test]
    async fn decodes_global_quote_payload() {
        let client = client_with(
            200,
            r#"{"Global Quote":{"01. symbol":"SPY","05. price":"512.3400","06. volume":"43210000","10. change percent":"0.4512%"}}"#,
        );

        let snapshot = client.snapshot().await.expect("snapshot succeeds");
        assert_eq!(snapshot.quotes.len(), 1);
        let quote = &snapshot.quotes[0];
        assert_eq!(quote.symbol.as_str(), "SPY");
        assert!((quote.price - 512.34).abs() < 1e-9);
        assert_eq!(quote.volume, Some(43_210_000));
        assert!((quote.change_percent.expect("percent") - 0.4512).abs() < 1e-9);
    }

    #[tokio::test]
    async fn body_level_throttle_note_maps_to_rate_limited() {
        let client = client_with(
            200,
            r#"{"Note":"Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#,
        );

        let error = client.snapshot().await.expect_err("must fail");
        assert_eq!(error.code(), "fetch.rate_limited");
    }

    #[tokio::test]
    async fn http_429_maps_to_rate_limited() {
        let client = client_with(429, "");
        let error = client.snapshot().await.expect_err("must fail");
        assert_eq!(error.code(), "fetch.rate_limited");
    }

    #[tokio::test]
    async fn empty_quote_maps_to_not_found() {
        let client = client_with(200, r#"{"Global Quote":{}}"#);
        let error = client.snapshot().await.expect_err("must fail");
        assert_eq!(error.code(), "fetch.not_found");
    }
}
