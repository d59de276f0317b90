use thiserror::Error;

use marketfront_core::{FetchError, FetchErrorKind, StoreError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream error: {0}")]
    Upstream(FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::NotFound(_) => 3,
            Self::Config(_) => 4,
            Self::Upstream(_) | Self::Store(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}

impl From<FetchError> for CliError {
    fn from(error: FetchError) -> Self {
        match error.kind() {
            FetchErrorKind::NotFound => Self::NotFound(error.message().to_owned()),
            _ => Self::Upstream(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_gets_its_own_exit_code() {
        let error = CliError::from(FetchError::not_found("no such ticker"));
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn other_fetch_failures_exit_as_upstream_errors() {
        let error = CliError::from(FetchError::rate_limited("quota exhausted"));
        assert_eq!(error.exit_code(), 10);
    }
}
