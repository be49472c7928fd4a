//! Error handling for the application

use thiserror::Error;

/// Drawdown metrics errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("ATH must be positive, got {0}")]
    InvalidAth(f64),

    #[error("Need at least 2 closes to derive metrics, got {0}")]
    InsufficientHistory(usize),
}

/// Upstream fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request failed with status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Unexpected payload: {0}")]
    Payload(String),
}

/// Alert-state persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl From<MetricsError> for AppError {
    fn from(err: MetricsError) -> Self {
        AppError::MetricsError(err.to_string())
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::FetchError(err.to_string())
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}
