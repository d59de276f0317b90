//! # Marketfront Core
//!
//! Data-coordination core for the Marketfront financial data facade.
//!
//! ## Overview
//!
//! This crate provides the building blocks the domain services compose:
//!
//! - **Canonical domain models** for market snapshots, company profiles,
//!   sentiment summaries, and analysis reports
//! - **TTL cache store** with lazy expiry and stale-value retention
//! - **Request coordinator** that collapses concurrent identical fetches
//!   into one upstream call
//! - **Upstream client traits** with normalized failure classification
//! - **Retry with backoff** for transient upstream failures
//! - **Rate budgets** so free-tier provider quotas fail fast locally
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`budget`] | Local per-provider rate budgets |
//! | [`cache`] | TTL cache store with stale lookups |
//! | [`coordinator`] | In-flight request deduplication |
//! | [`domain`] | Domain models (snapshot, profile, sentiment, analysis) |
//! | [`error`] | Core error types |
//! | [`http`] | HTTP client abstraction |
//! | [`policy`] | Per-domain cache/retry/quota defaults |
//! | [`providers`] | Bundled provider adapters |
//! | [`retry`] | Bounded retry with backoff |
//! | [`store`] | Persisted analysis store boundary |
//! | [`upstream`] | Client traits and fetch error classification |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use marketfront_core::{AlphaVantageClient, MarketDataClient, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Arc::new(ReqwestHttpClient::new());
//!     let client = AlphaVantageClient::new(http, std::env::var("ALPHA_VANTAGE_API_KEY")?);
//!
//!     let snapshot = client.snapshot().await?;
//!     for quote in &snapshot.quotes {
//!         println!("{}: {:.2}", quote.symbol, quote.price);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Upstream failures are normalized into [`FetchError`] with a closed set
//! of kinds, so callers branch on meaning rather than provider quirks:
//!
//! ```rust
//! use marketfront_core::{FetchError, FetchErrorKind};
//!
//! fn handle_error(error: FetchError) {
//!     match error.kind() {
//!         FetchErrorKind::NotFound => {
//!             // Nothing to serve, stale or otherwise
//!         }
//!         FetchErrorKind::RateLimited => {
//!             // Prefer stale cache data
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables only (never logged)
//! - All HTTP requests use TLS via rustls
//! - Input validation on all domain types

pub mod budget;
pub mod cache;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod http;
pub mod policy;
pub mod providers;
pub mod retry;
pub mod store;
pub mod upstream;

// Re-export commonly used types at crate root for convenience

// Rate budgets
pub use budget::RateBudget;

// Caching
pub use cache::{CacheStore, Lookup};

// Request coordination
pub use coordinator::{cache_key, RequestCoordinator};

// Domain models
pub use domain::{
    AnalysisReport, CompanyProfile, Headline, IndexQuote, MarketSnapshot, SentimentLabel,
    SentimentSummary, Ticker, UtcTimestamp,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Policies
pub use policy::{AnalysisPolicy, DomainPolicy, QuotaPolicy};

// Provider adapters
pub use providers::{AlphaVantageClient, FinnhubClient, NewsApiClient};

// Retry logic
pub use retry::{fetch_with_retry, Backoff, RetryConfig};

// Persisted store boundary
pub use store::{AnalysisRecord, AnalysisStore, StoreError, StoreFuture};

// Upstream traits and failure classification
pub use upstream::{
    classify_status, AnalysisClient, CompanyClient, FetchError, FetchErrorKind, FetchFuture,
    MarketDataClient, ProviderId, SentimentClient,
};
