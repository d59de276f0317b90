use serde::{Deserialize, Serialize};

use crate::{Ticker, UtcTimestamp};

/// Quote for a single tracked index proxy inside a market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub symbol: Ticker,
    pub price: f64,
    pub change_percent: Option<f64>,
    pub volume: Option<u64>,
}

/// Real-time view of the broad market, assembled from tracked index quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub quotes: Vec<IndexQuote>,
    pub as_of: UtcTimestamp,
}

/// Company fundamentals normalized from the company-info provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ticker: Ticker,
    pub name: String,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    /// Market capitalization in millions of the listing currency.
    pub market_cap: Option<f64>,
    pub currency: Option<String>,
    pub ipo_date: Option<String>,
    pub website: Option<String>,
    pub as_of: UtcTimestamp,
}

/// Aggregate mood derived from scored headlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

/// Single scored news headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source: String,
    pub published_at: Option<String>,
    /// Lexicon score: positive keywords minus negative keywords.
    pub score: i32,
}

/// Market-wide news sentiment summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub label: SentimentLabel,
    /// Mean headline score, in `[-1.0, 1.0]` after normalization.
    pub score: f64,
    pub headline_count: usize,
    pub headlines: Vec<Headline>,
    pub as_of: UtcTimestamp,
}

impl SentimentSummary {
    /// Derive the aggregate label from a normalized mean score.
    pub fn label_for_score(score: f64) -> SentimentLabel {
        if score > 0.15 {
            SentimentLabel::Bullish
        } else if score < -0.15 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Computed technical/fundamental analysis for one ticker.
///
/// The metrics payload is opaque to the coordination core; it is produced
/// by the analysis upstream and persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: Ticker,
    pub verdict: String,
    pub metrics: serde_json::Value,
    pub computed_at: UtcTimestamp,
}
