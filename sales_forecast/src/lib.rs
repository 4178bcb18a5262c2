//! # Sales Forecast
//!
//! Daily sales forecasting for many (product, store) series with one shared
//! gradient boosted regressor.
//!
//! ## Features
//!
//! - Sales dataset loading from Parquet or CSV (catalog, sales and name tables)
//! - Series keys, label encoding and cyclical calendar encodings
//! - Lag and rolling-window features with recursive multi-step forecasts
//! - Model persistence with the fitted id encoders
//! - A prediction service core shared by the HTTP endpoint
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::data::DataLoader;
//! use sales_forecast::features::encode_data;
//! use sales_forecast::forecast::{ForecastConfig, Forecaster};
//! use sales_forecast::store::save_model;
//!
//! # fn main() -> sales_forecast::Result<()> {
//! let data = DataLoader::from_parquet("data/files/data.parquet")?;
//! let (encoder, encoded) = encode_data(&data.sales)?;
//!
//! let forecaster = Forecaster::new(ForecastConfig::default())?;
//! let (train, val) = forecaster.split(&encoded);
//! let model = forecaster.fit(encoder, &train)?;
//!
//! let pred_date = "2023-12-10".parse().expect("valid date");
//! let predictions = model.predict(10, &val, &data.catalog, pred_date, "c8c368f0311ea25b581cb3c704fe3a70")?;
//! println!("{} predictions", predictions.len());
//!
//! save_model(&model, "data/files/model.json")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod metrics;
pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use crate::config::Paths;
pub use crate::data::{CatalogEntry, DataLoader, SaleName, SalesData, SalesRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{encode_data, EncodedRecord, SeriesEncoder};
pub use crate::forecast::{ForecastConfig, Forecaster, PredictionRecord, TrainedForecaster};
pub use crate::service::{PredictionRequest, PredictionResponse, PredictionService, ServiceError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
