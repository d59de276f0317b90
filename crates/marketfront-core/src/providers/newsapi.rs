//! NewsAPI adapter: business headlines scored into a market sentiment
//! summary.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http::{HttpAuth, HttpClient, HttpRequest};
use crate::policy::{DomainPolicy, QuotaPolicy};
use crate::retry::fetch_with_retry;
use crate::upstream::{classify_status, FetchFuture, ProviderId, SentimentClient};
use crate::{
    FetchError, Headline, RateBudget, RetryConfig, SentimentSummary, UtcTimestamp,
};

const BASE_URL: &str = "https://newsapi.org/v2/top-headlines";
const PAGE_SIZE: u32 = 20;

/// Keyword lexicon for headline scoring. Crude on purpose; the summary is
/// a mood gauge, not a trading signal.
const POSITIVE_TERMS: &[&str] = &[
    "surge", "rally", "gain", "gains", "record", "beat", "beats", "soar",
    "soars", "jump", "jumps", "growth", "upbeat", "bullish", "optimism",
    "recovery", "upgrade", "strong",
];
const NEGATIVE_TERMS: &[&str] = &[
    "fall", "falls", "drop", "drops", "plunge", "plunges", "slump", "crash",
    "loss", "losses", "miss", "misses", "fear", "fears", "bearish", "cut",
    "cuts", "recession", "downgrade", "weak", "layoff", "layoffs",
];

/// Sentiment client over the NewsAPI `top-headlines` endpoint.
pub struct NewsApiClient {
    http: Arc<dyn HttpClient>,
    auth: HttpAuth,
    budget: RateBudget,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl NewsApiClient {
    pub fn new(http: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let policy = DomainPolicy::sentiment_default();
        let quota = QuotaPolicy::newsapi_default();
        Self {
            http,
            auth: HttpAuth::QueryParam {
                name: String::from("apiKey"),
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

    async fn fetch_sentiment(&self) -> Result<SentimentSummary, FetchError> {
        if self.budget.try_acquire().is_err() {
            return Err(FetchError::rate_limited(
                "newsapi local quota exhausted; skipping upstream call",
            ));
        }

        let url = format!("{BASE_URL}?category=business&language=en&pageSize={PAGE_SIZE}");
        let body = fetch_with_retry(&self.retry, || {
            let request = HttpRequest::get(url.clone())
                .with_auth(&self.auth)
                .with_timeout_ms(self.timeout_ms);
            let http = Arc::clone(&self.http);
            async move {
                let response = http.execute(request).await.map_err(|error| {
                    if error.retryable() {
                        FetchError::transient(format!(
                            "newsapi transport error: {}",
                            error.message()
                        ))
                    } else {
                        FetchError::unknown(format!(
                            "newsapi transport error: {}",
                            error.message()
                        ))
                    }
                })?;

                if !response.is_success() {
                    return Err(classify_status(ProviderId::NewsApi, response.status));
                }
                Ok(response.body)
            }
        })
        .await?;

        summarize(&body)
    }
}

impl SentimentClient for NewsApiClient {
    fn market_sentiment(&self) -> FetchFuture<'_, SentimentSummary> {
        Box::pin(self.fetch_sentiment())
    }
}

/// NewsAPI reports application errors as `{"status":"error","code":...}`
/// bodies, sometimes behind a 200.
fn summarize(body: &str) -> Result<SentimentSummary, FetchError> {
    let payload: HeadlinesEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::unknown(format!("failed to decode newsapi response: {e}")))?;

    if payload.status.as_deref() == Some("error") {
        return Err(classify_api_error(
            payload.code.as_deref(),
            payload.message.as_deref(),
        ));
    }

    let headlines: Vec<Headline> = payload
        .articles
        .into_iter()
        .filter_map(|article| {
            let title = article.title?;
            let score = score_title(&title);
            Some(Headline {
                title,
                source: article.source.and_then(|s| s.name).unwrap_or_default(),
                published_at: article.published_at,
                score,
            })
        })
        .collect();

    if headlines.is_empty() {
        return Err(FetchError::not_found(
            "newsapi returned no business headlines",
        ));
    }

    let normalized_sum: f64 = headlines
        .iter()
        .map(|h| f64::from(h.score.clamp(-1, 1)))
        .sum();
    let score = normalized_sum / headlines.len() as f64;
    debug!(
        headlines = headlines.len(),
        score, "sentiment summary assembled"
    );

    Ok(SentimentSummary {
        label: SentimentSummary::label_for_score(score),
        score,
        headline_count: headlines.len(),
        headlines,
        as_of: UtcTimestamp::now(),
    })
}

fn classify_api_error(code: Option<&str>, message: Option<&str>) -> FetchError {
    let detail = message.unwrap_or("newsapi reported an error");
    match code {
        Some("rateLimited") => FetchError::rate_limited(detail),
        Some("apiKeyInvalid" | "apiKeyMissing" | "apiKeyDisabled") => {
            FetchError::unauthorized(detail)
        }
        _ => FetchError::unknown(detail),
    }
}

fn score_title(title: &str) -> i32 {
    let mut score = 0;
    for word in title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let lower = word.to_ascii_lowercase();
        if POSITIVE_TERMS.contains(&lower.as_str()) {
            score += 1;
        } else if NEGATIVE_TERMS.contains(&lower.as_str()) {
            score -= 1;
        }
    }
    score
}

#[derive(Debug, Deserialize)]
struct HeadlinesEnvelope {
    status: Option<String>,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ArticlePayload>,
}

#[derive(Debug, Deserialize)]
struct ArticlePayload {
    title: Option<String>,
    source: Option<SourcePayload>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourcePayload {
    name: Option<String>,
}
