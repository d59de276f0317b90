//! Persisted analysis store boundary.
//!
//! The analysis service consults a durable record before paying for a
//! recomputation; the store itself (DuckDB in production) is opaque to the
//! coordination core and carries no TTL semantics of its own.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AnalysisReport, Ticker, UtcTimestamp};

/// Durable analysis record keyed by ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub ticker: Ticker,
    pub report: AnalysisReport,
    pub computed_at: UtcTimestamp,
}

impl AnalysisRecord {
    pub fn from_report(report: AnalysisReport) -> Self {
        Self {
            ticker: report.ticker.clone(),
            computed_at: report.computed_at,
            report,
        }
    }
}

/// Errors surfaced by a persisted store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Read/write contract consumed by the analysis service.
///
/// Implementations must be durable and independently available from the
/// cache; availability failures show up as [`StoreError::Backend`].
pub trait AnalysisStore: Send + Sync {
    fn read<'a>(&'a self, ticker: &'a Ticker) -> StoreFuture<'a, Option<AnalysisRecord>>;
    fn write<'a>(&'a self, record: &'a AnalysisRecord) -> StoreFuture<'a, ()>;
}
