//! Upstream client contracts and failure normalization.
//!
//! Every provider-specific failure shape is mapped into a uniform
//! [`FetchError`] so the domain services and the outer surface never branch
//! on provider details. Only `Transient` failures are retried; rate-limit
//! and auth failures are surfaced promptly so callers can degrade instead
//! of blocking.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{AnalysisReport, CompanyProfile, MarketSnapshot, SentimentSummary, Ticker};

pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Upstream provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    AlphaVantage,
    Finnhub,
    NewsApi,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlphaVantage => "alphavantage",
            Self::Finnhub => "finnhub",
            Self::NewsApi => "newsapi",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized upstream failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The query has no valid target (unknown ticker, missing resource).
    NotFound,
    /// Provider quota exhausted; eligible for stale-data fallback.
    RateLimited,
    /// Credential rejected; configuration-class, never retried.
    Unauthorized,
    /// Timeouts, connection failures, 5xx responses; retried with backoff.
    Transient,
    /// Anything unclassifiable; treated like `Transient` for fallback but
    /// never retried, and logged under its own code.
    Unknown,
}

/// Uniform upstream failure surfaced to coordinators and services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Unauthorized,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Unknown,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Only transient failures are worth another attempt.
    pub const fn retryable(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Transient)
    }

    /// Whether a service holding a prior cached value should serve it stale
    /// instead of propagating this failure.
    pub const fn allows_stale_fallback(&self) -> bool {
        match self.kind {
            FetchErrorKind::RateLimited
            | FetchErrorKind::Transient
            | FetchErrorKind::Unknown
            | FetchErrorKind::Unauthorized => true,
            // A NotFound is an answer, not an outage.
            FetchErrorKind::NotFound => false,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::NotFound => "fetch.not_found",
            FetchErrorKind::RateLimited => "fetch.rate_limited",
            FetchErrorKind::Unauthorized => "fetch.unauthorized",
            FetchErrorKind::Transient => "fetch.transient",
            FetchErrorKind::Unknown => "fetch.unknown",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

/// Map an HTTP status from any provider onto the uniform taxonomy.
pub fn classify_status(provider: ProviderId, status: u16) -> FetchError {
    match status {
        404 => FetchError::not_found(format!("{provider} returned 404 for this query")),
        429 => FetchError::rate_limited(format!("{provider} rate limit exceeded")),
        401 | 403 => FetchError::unauthorized(format!("{provider} rejected the credential")),
        408 | 500..=599 => {
            FetchError::transient(format!("{provider} returned status {status}"))
        }
        other => FetchError::unknown(format!("{provider} returned unexpected status {other}")),
    }
}

/// Real-time market snapshot provider.
pub trait MarketDataClient: Send + Sync {
    fn snapshot(&self) -> FetchFuture<'_, MarketSnapshot>;
}

/// Company fundamentals provider.
pub trait CompanyClient: Send + Sync {
    fn profile<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a, CompanyProfile>;
}

/// News sentiment provider.
pub trait SentimentClient: Send + Sync {
    fn market_sentiment(&self) -> FetchFuture<'_, SentimentSummary>;
}

/// Computed technical/fundamental analysis provider.
pub trait AnalysisClient: Send + Sync {
    fn analyze<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a, AnalysisReport>;
}
