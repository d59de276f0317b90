//! Environment-driven configuration.
//!
//! API keys come from the environment only and are never echoed back in
//! logs or errors.

use std::env;
use std::path::PathBuf;

use crate::error::CliError;

pub const ALPHA_VANTAGE_KEY_VAR: &str = "ALPHA_VANTAGE_API_KEY";
pub const FINNHUB_KEY_VAR: &str = "FINNHUB_API_KEY";
pub const NEWS_API_KEY_VAR: &str = "NEWS_API_KEY";
pub const DB_PATH_VAR: &str = "MARKETFRONT_DB_PATH";

/// Read a required provider API key from the environment.
pub fn require_key(var: &str) -> Result<String, CliError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CliError::Config(format!(
            "missing API key: set the {var} environment variable"
        ))),
    }
}

/// Path of the local analysis database.
///
/// `MARKETFRONT_DB_PATH` overrides the default of
/// `~/.marketfront/analysis.duckdb` (falling back to the working directory
/// when no home directory is resolvable).
pub fn db_path() -> PathBuf {
    if let Ok(path) = env::var(DB_PATH_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    let home = env::var("HOME").or_else(|_| env::var("USERPROFILE"));
    match home {
        Ok(home) if !home.trim().is_empty() => {
            PathBuf::from(home).join(".marketfront").join("analysis.duckdb")
        }
        _ => PathBuf::from("marketfront-analysis.duckdb"),
    }
}
