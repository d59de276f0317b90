//! # Marketfront Store
//!
//! DuckDB-backed implementation of the persisted analysis store. One
//! durable row per ticker holds the latest computed report; the metrics
//! payload is stored as JSON text and decoded on read.

pub mod migrations;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ::duckdb::{params, Connection};
use tracing::debug;

use marketfront_core::{
    AnalysisRecord, AnalysisReport, AnalysisStore, StoreError, StoreFuture, Ticker, UtcTimestamp,
};

/// Persisted analysis store over a single DuckDB database file.
///
/// Queries are short single-row lookups, so one connection behind a mutex
/// is enough; there is no pool.
pub struct DuckDbAnalysisStore {
    connection: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbAnalysisStore {
    /// Open (or create) the database at `path` and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("cannot create store directory: {e}")))?;
        }

        let connection = Connection::open(path)
            .map_err(|e| StoreError::Backend(format!("cannot open analysis store: {e}")))?;
        migrations::apply_migrations(&connection)
            .map_err(|e| StoreError::Backend(format!("cannot migrate analysis store: {e}")))?;

        debug!(path = %path.display(), "analysis store opened");
        Ok(Self {
            connection: Mutex::new(connection),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Ephemeral in-memory store, mainly for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory()
            .map_err(|e| StoreError::Backend(format!("cannot open analysis store: {e}")))?;
        migrations::apply_migrations(&connection)
            .map_err(|e| StoreError::Backend(format!("cannot migrate analysis store: {e}")))?;

        Ok(Self {
            connection: Mutex::new(connection),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn read_record(&self, ticker: &Ticker) -> Result<Option<AnalysisRecord>, StoreError> {
        let connection = self
            .connection
            .lock()
            .expect("store connection lock is not poisoned");

        let queried = connection.query_row(
            "SELECT verdict, metrics, computed_at FROM analysis_reports WHERE ticker = ?",
            params![ticker.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        );
        let row = match queried {
            Ok(row) => Some(row),
            Err(::duckdb::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(StoreError::Backend(format!("analysis read failed: {e}"))),
        };

        let Some((verdict, metrics_json, computed_at_raw)) = row else {
            return Ok(None);
        };

        let metrics = serde_json::from_str(&metrics_json)
            .map_err(|e| StoreError::Corrupt(format!("undecodable metrics payload: {e}")))?;
        let computed_at = UtcTimestamp::parse(&computed_at_raw)
            .map_err(|e| StoreError::Corrupt(format!("undecodable computed_at: {e}")))?;

        Ok(Some(AnalysisRecord {
            ticker: ticker.clone(),
            report: AnalysisReport {
                ticker: ticker.clone(),
                verdict,
                metrics,
                computed_at,
            },
            computed_at,
        }))
    }

    fn write_record(&self, record: &AnalysisRecord) -> Result<(), StoreError> {
        let metrics_json = serde_json::to_string(&record.report.metrics)
            .map_err(|e| StoreError::Corrupt(format!("unencodable metrics payload: {e}")))?;

        let connection = self
            .connection
            .lock()
            .expect("store connection lock is not poisoned");

        connection
            .execute(
                r#"
INSERT OR REPLACE INTO analysis_reports (ticker, verdict, metrics, computed_at)
VALUES (?, ?, ?, ?)
"#,
                params![
                    record.ticker.as_str(),
                    record.report.verdict,
                    metrics_json,
                    record.computed_at.format_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Backend(format!("analysis write failed: {e}")))?;

        debug!(ticker = %record.ticker, "analysis record persisted");
        Ok(())
    }
}

impl AnalysisStore for DuckDbAnalysisStore {
    fn read<'a>(&'a self, ticker: &'a Ticker) -> StoreFuture<'a, Option<AnalysisRecord>> {
        Box::pin(async move { self.read_record(ticker) })
    }

    fn write<'a>(&'a self, record: &'a AnalysisRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.write_record(record) })
    }
}
