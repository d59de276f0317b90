//! Finnhub adapter: company fundamentals and computed analysis metrics.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http::{HttpAuth, HttpClient, HttpRequest};
use crate::policy::{DomainPolicy, QuotaPolicy};
use crate::retry::fetch_with_retry;
use crate::upstream::{
    classify_status, AnalysisClient, CompanyClient, FetchFuture, ProviderId,
};
use crate::{
    AnalysisReport, CompanyProfile, FetchError, RateBudget, RetryConfig, Ticker, UtcTimestamp,
};

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub client serving both the company and analysis domains.
///
/// Finnhub reports an unknown symbol as an empty `200` payload rather than
/// a `404`, so emptiness checks stand in for status-based not-found
/// classification.
pub struct FinnhubClient {
    http: Arc<dyn HttpClient>,
    auth: HttpAuth,
    budget: RateBudget,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl FinnhubClient {
    pub fn new(http: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let policy = DomainPolicy::company_default();
        let quota = QuotaPolicy::finnhub_default();
        Self {
            http,
            auth: HttpAuth::Header {
                name: String::from("X-Finnhub-Token"),
                value: api_key.into(),
            },
            budget: RateBudget::new(quota.window, quota.limit),
            retry: policy.retry,
            timeout_ms: policy.request_timeout.as_millis() as u64,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn get_body(&self, url: String) -> Result<String, FetchError> {
        if self.budget.try_acquire().is_err() {
            return Err(FetchError::rate_limited(
                "finnhub local quota exhausted; skipping upstream call",
            ));
        }

        fetch_with_retry(&self.retry, || {
            let request = HttpRequest::get(url.clone())
                .with_auth(&self.auth)
                .with_timeout_ms(self.timeout_ms);
            let http = Arc::clone(&self.http);
            async move {
                let response = http.execute(request).await.map_err(|error| {
                    if error.retryable() {
                        FetchError::transient(format!(
                            "finnhub transport error: {}",
                            error.message()
                        ))
                    } else {
                        FetchError::unknown(format!(
                            "finnhub transport error: {}",
                            error.message()
                        ))
                    }
                })?;

                if !response.is_success() {
                    return Err(classify_status(ProviderId::Finnhub, response.status));
                }
                Ok(response.body)
            }
        })
        .await
    }

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, FetchError> {
        let url = format!("{BASE_URL}/stock/profile2?symbol={}", ticker.as_str());
        let body = self.get_body(url).await?;

        let payload: ProfilePayload = serde_json::from_str(&body)
            .map_err(|e| FetchError::unknown(format!("failed to decode finnhub profile: {e}")))?;

        let name = payload.name.filter(|n| !n.is_empty()).ok_or_else(|| {
            FetchError::not_found(format!("no company profile for '{}'", ticker.as_str()))
        })?;

        Ok(CompanyProfile {
            ticker: ticker.clone(),
            name,
            exchange: payload.exchange.filter(|v| !v.is_empty()),
            industry: payload.industry.filter(|v| !v.is_empty()),
            market_cap: payload.market_capitalization,
            currency: payload.currency.filter(|v| !v.is_empty()),
            ipo_date: payload.ipo.filter(|v| !v.is_empty()),
            website: payload.weburl.filter(|v| !v.is_empty()),
            as_of: UtcTimestamp::now(),
        })
    }

    async fn fetch_analysis(&self, ticker: &Ticker) -> Result<AnalysisReport, FetchError> {
        let metric_url = format!(
            "{BASE_URL}/stock/metric?symbol={}&metric=all",
            ticker.as_str()
        );
        let body = self.get_body(metric_url).await?;

        let payload: MetricPayload = serde_json::from_str(&body)
            .map_err(|e| FetchError::unknown(format!("failed to decode finnhub metrics: {e}")))?;

        let metrics = payload.metric.unwrap_or(serde_json::Value::Null);
        let is_empty = match &metrics {
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::Null => true,
            _ => false,
        };
        if is_empty {
            return Err(FetchError::not_found(format!(
                "no analysis metrics for '{}'",
                ticker.as_str()
            )));
        }

        let verdict = self.fetch_verdict(ticker).await?;
        debug!(ticker = ticker.as_str(), verdict = %verdict, "analysis assembled");

        Ok(AnalysisReport {
            ticker: ticker.clone(),
            verdict,
            metrics,
            computed_at: UtcTimestamp::now(),
        })
    }

    /// Latest analyst recommendation row decides the verdict; a symbol with
    /// metrics but no coverage defaults to `hold`.
    async fn fetch_verdict(&self, ticker: &Ticker) -> Result<String, FetchError> {
        let url = format!(
            "{BASE_URL}/stock/recommendation?symbol={}",
            ticker.as_str()
        );
        let body = self.get_body(url).await?;

        let rows: Vec<RecommendationRow> = serde_json::from_str(&body).map_err(|e| {
            FetchError::unknown(format!("failed to decode finnhub recommendations: {e}"))
        })?;

        Ok(rows.first().map_or_else(|| String::from("hold"), verdict_for))
    }
}

impl CompanyClient for FinnhubClient {
    fn profile<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a, CompanyProfile> {
        Box::pin(self.fetch_profile(ticker))
    }
}

impl AnalysisClient for FinnhubClient {
    fn analyze<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a, AnalysisReport> {
        Box::pin(self.fetch_analysis(ticker))
    }
}

fn verdict_for(row: &RecommendationRow) -> String {
    let buy = row.strong_buy + row.buy;
    let sell = row.strong_sell + row.sell;
    if buy > row.hold && buy > sell {
        String::from("buy")
    } else if sell > row.hold && sell > buy {
        String::from("sell")
    } else {
        String::from("hold")
    }
}

#[derive(Debug, Deserialize)]
struct ProfilePayload {
    name: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "finnhubIndustry")]
    industry: Option<String>,
    #[serde(rename = "marketCapitalization")]
    market_capitalization: Option<f64>,
    currency: Option<String>,
    ipo: Option<String>,
    weburl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetricPayload {
    metric: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationRow {
    #[serde(rename = "strongBuy", default)]
    strong_buy: u32,
    #[serde(default)]
    buy: u32,
    #[serde(default)]
    hold: u32,
    #[serde(default)]
    sell: u32,
    #[serde(rename = "strongSell", default)]
    strong_sell: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    /// Replays one canned response per call, in order.
    struct SequencedHttp {
        responses: Mutex<Vec<HttpResponse>>,
    }

    impl SequencedHttp {
        fn new(responses: Vec<(u16, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .rev()
                        .map(|(status, body)| HttpResponse {
                            status,
                            body: body.to_owned(),
                        })
                        .collect(),
                ),
            }
        }
    }

    impl HttpClient for SequencedHttp {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let next = self
                .responses
                .lock()
                .expect("response list lock poisoned")
                .pop()
                .expect("unexpected extra http call");
            Box::pin(async move { Ok(next) })
        }
    }

    fn ticker(raw: &str) -> Ticker {
        Ticker::parse(raw).expect("valid ticker")
    }

    #[tokio::test]
    async fn decodes_company_profile() {
        let http = SequencedHttp::new(vec![(
            200,
            r#"{"name":"Apple Inc","exchange":"NASDAQ","finnhubIndustry":"Technology","marketCapitalization":2800000.5,"currency":"USD","ipo":"1980-12-12","weburl":"https://www.apple.com/"}"#,
        )]);
        let client =
            FinnhubClient::new(Arc::new(http), "token").with_retry(RetryConfig::no_retry());

        let profile = client.profile(&ticker("AAPL")).await.expect("profile");
        assert_eq!(profile.name, "Apple Inc");
        assert_eq!(profile.exchange.as_deref(), Some("NASDAQ"));
        assert_eq!(profile.industry.as_deref(), Some("Technology"));
        assert_eq!(profile.ipo_date.as_deref(), Some("1980-12-12"));
    }

    #[tokio::test]
    async fn empty_profile_payload_maps_to_not_found() {
        let http = SequencedHttp::new(vec![(200, "{}")]);
        let client =
            FinnhubClient::new(Arc::new(http), "token").with_retry(RetryConfig::no_retry());

        let error = client
            .profile(&ticker("ZZZZ"))
            .await
            .expect_err("must fail");
        assert_eq!(error.code(), "fetch.not_found");
    }

    #[tokio::test]
    async fn analysis_combines_metrics_and_recommendation() {
        let http = SequencedHttp::new(vec![
            (200, r#"{"metric":{"peBasicExclExtraTTM":29.3,"beta":1.2}}"#),
            (
                200,
                r#"[{"strongBuy":12,"buy":20,"hold":8,"sell":1,"strongSell":0,"period":"2024-06-01"}]"#,
            ),
        ]);
        let client =
            FinnhubClient::new(Arc::new(http), "token").with_retry(RetryConfig::no_retry());

        let report = client.analyze(&ticker("AAPL")).await.expect("report");
        assert_eq!(report.verdict, "buy");
        assert_eq!(report.metrics["beta"], serde_json::json!(1.2));
    }

    #[tokio::test]
    async fn empty_metrics_map_to_not_found_without_second_call() {
        let http = SequencedHttp::new(vec![(200, r#"{"metric":{},"series":{}}"#)]);
        let client =
            FinnhubClient::new(Arc::new(http), "token").with_retry(RetryConfig::no_retry());

        let error = client
            .analyze(&ticker("ZZZZ"))
            .await
            .expect_err("must fail");
        assert_eq!(error.code(), "fetch.not_found");
    }

    #[tokio::test]
    async fn unauthorized_status_maps_to_unauthorized() {
        let http = SequencedHttp::new(vec![(401, r#"{"error":"Invalid API key"}"#)]);
        let client =
            FinnhubClient::new(Arc::new(http), "bad-token").with_retry(RetryConfig::no_retry());

        let error = client
            .profile(&ticker("AAPL"))
            .await
            .expect_err("must fail");
        assert_eq!(error.code(), "fetch.unauthorized");
    }

    #[test]
    fn verdict_prefers_the_dominant_bucket() {
        let buy_heavy = RecommendationRow {
            strong_buy: 10,
            buy: 10,
            hold: 5,
            sell: 1,
            strong_sell: 0,
        };
        let sell_heavy = RecommendationRow {
            strong_buy: 0,
            buy: 1,
            hold: 3,
            sell: 8,
            strong_sell: 2,
        };
        let mixed = RecommendationRow {
            strong_buy: 2,
            buy: 2,
            hold: 9,
            sell: 2,
            strong_sell: 1,
        };

        assert_eq!(verdict_for(&buy_heavy), "buy");
        assert_eq!(verdict_for(&sell_heavy), "sell");
        assert_eq!(verdict_for(&mixed), "hold");
    }
}
