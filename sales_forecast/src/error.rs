//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use sales_math::MathError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from categorical encoding, e.g. an unseen label
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Error from an unsupported configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error related to model fitting or prediction
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from a corrupt or incompatible model file
    #[error("Format error: {0}")]
    FormatError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::UnsupportedUnit(_) => ForecastError::ConfigError(err.to_string()),
            MathError::InsufficientData(_) => ForecastError::DataError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::FormatError(err.to_string())
    }
}
