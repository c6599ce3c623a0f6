//! Error types for catalog and ephemeris data access

use orrery_core::ConfigError;
use thiserror::Error;

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

/// Errors raised while fetching or decoding catalog and ephemeris data.
///
/// Everything except [`DataError::Config`] and [`DataError::InvalidRequest`] is
/// transient: callers recover by falling back to synthetic data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DataError {
    /// True when a synthetic fallback is the right response
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::InvalidRequest(_))
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if err.is_decode() {
            DataError::Decode(err.to_string())
        } else {
            DataError::Network(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for DataError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        DataError::Timeout(err.to_string())
    }
}
