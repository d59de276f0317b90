//! Canonical domain models shared by the cache, the upstream clients, and
//! the domain services.

mod models;
mod ticker;
mod timestamp;

pub use models::{
    AnalysisReport, CompanyProfile, Headline, IndexQuote, MarketSnapshot, SentimentLabel,
    SentimentSummary,
};
pub use ticker::Ticker;
pub use timestamp::UtcTimestamp;
