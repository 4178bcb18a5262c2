//! Request handling behind the prediction endpoint

use crate::config::Paths;
use crate::data::{parse_date, CatalogEntry, DataLoader, SalesData};
use crate::error::{ForecastError, Result};
use crate::features::{add_cyclical_calendar_features, EncodedRecord};
use crate::forecast::{PredictionRecord, TrainedForecaster};
use crate::store::load_model;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Calendar units encoded when the reference data is prepared
pub const SERVICE_CYCLICAL_FEATURES: [&str; 2] = ["day", "week"];

/// Longest forecast a single request may ask for, in days
pub const MAX_HORIZON: usize = 366;

/// Body of a prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub store_id: String,
    /// `YYYY-MM-DD`
    pub sale_date: String,
    pub sale_id: String,
    pub horizon: i64,
}

/// Predicted records for the product and its display name.
///
/// Serializes as a two-element JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse(pub Vec<PredictionRecord>, pub String);

impl PredictionResponse {
    pub fn records(&self) -> &[PredictionRecord] {
        &self.0
    }

    pub fn sale_name(&self) -> &str {
        &self.1
    }

    /// Sum of predicted amounts over all returned dates
    pub fn total_amount(&self) -> f64 {
        self.0.iter().map(|r| r.predicted_amount).sum()
    }
}

/// Failures reported to prediction clients
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<ForecastError> for ServiceError {
    fn from(err: ForecastError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Model and reference data loaded once and shared read-only by all requests
#[derive(Debug)]
pub struct PredictionService {
    model: TrainedForecaster,
    history: Vec<EncodedRecord>,
    catalog: Vec<CatalogEntry>,
    names: HashMap<String, String>,
}

impl PredictionService {
    /// Load the model and dataset from their standard locations
    pub fn from_paths(paths: &Paths) -> Result<Self> {
        let model: TrainedForecaster = load_model(&paths.model_path)?;
        let data = DataLoader::from_path(&paths.data_path)?;
        Self::new(model, data)
    }

    /// Prepare reference data with the encoders captured by `model`
    pub fn new(model: TrainedForecaster, data: SalesData) -> Result<Self> {
        let dates: Vec<_> = data.sales.iter().map(|r| r.sale_date).collect();
        let cyclical = add_cyclical_calendar_features(&dates, &SERVICE_CYCLICAL_FEATURES)?;
        debug!(columns = ?cyclical.names(), "calendar features computed");

        let history = model.encoder().transform(&data.sales)?;

        let mut names = HashMap::with_capacity(data.sale_id_to_name.len());
        for entry in data.sale_id_to_name {
            names.entry(entry.sale_id).or_insert(entry.sale_name);
        }

        info!(
            rows = history.len(),
            products = names.len(),
            "prediction service ready"
        );

        Ok(Self {
            model,
            history,
            catalog: data.catalog,
            names,
        })
    }

    pub fn model(&self) -> &TrainedForecaster {
        &self.model
    }

    /// Display name of a product
    pub fn sale_name(&self, sale_id: &str) -> Option<&str> {
        self.names.get(sale_id).map(String::as_str)
    }

    pub fn predict(&self, request: &PredictionRequest) -> std::result::Result<PredictionResponse, ServiceError> {
        let horizon = usize::try_from(request.horizon)
            .ok()
            .filter(|h| (1..=MAX_HORIZON).contains(h))
            .ok_or_else(|| {
                ServiceError::InvalidRequest(format!(
                    "horizon must be between 1 and {}, got {}",
                    MAX_HORIZON, request.horizon
                ))
            })?;
        let pred_date = parse_date(&request.sale_date).map_err(|e| {
            ServiceError::InvalidRequest(format!(
                "sale_date '{}' is not a YYYY-MM-DD date: {}",
                request.sale_date, e
            ))
        })?;
        let sale_name = self
            .sale_name(&request.sale_id)
            .ok_or_else(|| ServiceError::NotFound(format!("unknown sale_id '{}'", request.sale_id)))?
            .to_string();

        let store_predictions = self.model.predict(
            horizon,
            &self.history,
            &self.catalog,
            pred_date,
            &request.store_id,
        )?;
        let records: Vec<PredictionRecord> = store_predictions
            .into_iter()
            .filter(|r| r.sale_id == request.sale_id)
            .collect();

        debug!(
            store_id = %request.store_id,
            sale_id = %request.sale_id,
            records = records.len(),
            "prediction served"
        );

        Ok(PredictionResponse(records, sale_name))
    }
}
