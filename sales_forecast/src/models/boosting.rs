//! Gradient-boosted regression trees backed by the `gbdt` crate

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Hyperparameters of the booster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: u32,
    /// Shrinkage applied to each tree
    pub learning_rate: f64,
    /// Minimum number of rows in a leaf
    pub min_leaf_size: usize,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.3,
            min_leaf_size: 1,
        }
    }
}

impl BoosterParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_depth must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ForecastError::InvalidParameter(
                "learning_rate must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Squared-error gradient boosting regressor
#[derive(Serialize, Deserialize)]
pub struct GbdtRegressor {
    params: BoosterParams,
    n_features: usize,
    model: Option<GBDT>,
}

impl GbdtRegressor {
    pub fn new(params: BoosterParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            n_features: 0,
            model: None,
        })
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn config(&self, n_features: usize) -> Config {
        let mut cfg = Config::new();
        cfg.set_feature_size(n_features);
        cfg.set_max_depth(self.params.max_depth);
        cfg.set_min_leaf_size(self.params.min_leaf_size);
        cfg.set_iterations(self.params.n_estimators);
        cfg.set_shrinkage(self.params.learning_rate as ValueType);
        cfg.set_loss("SquaredError");
        cfg.set_data_sample_ratio(1.0);
        cfg.set_feature_sample_ratio(1.0);
        cfg.set_training_optimization_level(2);
        cfg.set_debug(false);
        cfg
    }

    fn check_width(&self, features: &[Vec<f64>], expected: usize) -> Result<()> {
        match features.iter().position(|row| row.len() != expected) {
            Some(row) => Err(ForecastError::ModelError(format!(
                "Feature row {} has {} columns, expected {}",
                row,
                features[row].len(),
                expected
            ))),
            None => Ok(()),
        }
    }
}

fn to_values(row: &[f64]) -> Vec<ValueType> {
    row.iter().map(|v| *v as ValueType).collect()
}

impl fmt::Debug for GbdtRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GbdtRegressor")
            .field("params", &self.params)
            .field("n_features", &self.n_features)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl Regressor for GbdtRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        if features.is_empty() {
            return Err(ForecastError::ModelError(
                "Cannot fit with 0 samples".to_string(),
            ));
        }
        if features.len() != targets.len() {
            return Err(ForecastError::ModelError(format!(
                "features ({}) and targets ({}) must have the same number of samples",
                features.len(),
                targets.len()
            )));
        }

        let n_features = features[0].len();
        self.check_width(features, n_features)?;

        let mut training: DataVec = features
            .iter()
            .zip(targets)
            .map(|(row, target)| Data::new_training_data(to_values(row), 1.0, *target as ValueType, None))
            .collect();

        debug!(
            rows = training.len(),
            n_features,
            n_estimators = self.params.n_estimators,
            "fitting gradient boosted trees"
        );

        let mut model = GBDT::new(&self.config(n_features));
        model.fit(&mut training);

        self.n_features = n_features;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ForecastError::ModelError("Model is not fitted".to_string()))?;
        if features.is_empty() {
            return Ok(Vec::new());
        }
        self.check_width(features, self.n_features)?;

        let rows: DataVec = features
            .iter()
            .map(|row| Data::new_test_data(to_values(row), None))
            .collect();

        Ok(model.predict(&rows).into_iter().map(f64::from).collect())
    }

    fn name(&self) -> &str {
        "GBDTRegressor"
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
    }
}
