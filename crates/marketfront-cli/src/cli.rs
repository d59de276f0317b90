//! CLI argument definitions for Marketfront.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `market` | Fetch the current market snapshot |
//! | `company <TICKER>` | Fetch a company profile |
//! | `sentiment` | Fetch the market-wide news sentiment summary |
//! | `analysis <TICKER>` | Fetch the analysis report for a ticker |
//!
//! # Examples
//!
//! ```bash
//! # Current market snapshot
//! marketfront market
//!
//! # Company profile, pretty-printed
//! marketfront company AAPL --pretty
//!
//! # Analysis report backed by the local DuckDB store
//! marketfront analysis MSFT
//! ```

use clap::{Parser, Subcommand};

/// Marketfront - cached financial data facade
///
/// Serves market snapshots, company profiles, news sentiment, and analysis
/// reports from free-tier providers, with caching, request coordination,
/// and stale-data fallback between you and their rate limits.
#[derive(Debug, Parser)]
#[command(
    name = "marketfront",
    author,
    version,
    about = "Cached financial data facade"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the current market snapshot (tracked index quotes).
    Market,

    /// Fetch the company profile for a ticker.
    Company {
        /// Ticker symbol, case-insensitive.
        ticker: String,
    },

    /// Fetch the market-wide news sentiment summary.
    Sentiment,

    /// Fetch the analysis report for a ticker.
    Analysis {
        /// Ticker symbol, case-insensitive.
        ticker: String,
    },
}
