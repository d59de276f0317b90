//! # Marketfront Services
//!
//! Domain services for the Marketfront facade. Each service composes a
//! TTL cache, a request coordinator, and an upstream client into one
//! query path:
//!
//! 1. Serve a fresh cache hit without touching the upstream.
//! 2. Otherwise run the fetch through the coordinator, so concurrent
//!    identical queries share one upstream call.
//! 3. On upstream failure, serve an expired cached value flagged stale
//!    when the failure kind permits it; `NotFound` always propagates.
//!
//! The analysis service additionally consults a durable store before
//! recomputing and writes every computed report back.

pub mod analysis;
pub mod company;
pub mod market;
pub mod sentiment;
mod serve;

pub use analysis::AnalysisService;
pub use company::CompanyService;
pub use market::MarketService;
pub use sentiment::SentimentService;
pub use serve::Served;
