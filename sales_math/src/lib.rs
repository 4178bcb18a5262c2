//! # Sales Math
//!
//! Numeric building blocks for the sales forecasting pipeline.
//! This crate provides the trailing-window operations used to derive lag
//! features and the calendar fields used for date features and cyclical
//! encodings.

use thiserror::Error;

pub mod calendar;
pub mod window;

/// Errors that can occur in window and calendar calculations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Cyclical encoding is not available for {0}")]
    UnsupportedUnit(String),
}

/// Result type for sales math operations
pub type Result<T> = std::result::Result<T, MathError>;
