//! Bundled provider adapters.
//!
//! Each adapter owns its transport handle, rate budget, and retry policy,
//! and normalizes provider-specific failure shapes into [`FetchError`]
//! before anything leaves this module.
//!
//! [`FetchError`]: crate::FetchError

mod alphavantage;
mod finnhub;
mod newsapi;

pub use alphavantage::AlphaVantageClient;
pub use finnhub::FinnhubClient;
pub use newsapi::NewsApiClient;
