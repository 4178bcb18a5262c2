//! Regression models used by the forecaster

use crate::error::Result;
use std::fmt::Debug;

/// A supervised regressor shared by every series.
///
/// Rows of `features` all have the same length, in the column order produced
/// by the forecaster.
pub trait Regressor: Debug + Send + Sync {
    /// Fit the regressor on feature rows and their targets
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()>;

    /// Predict one value per feature row
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;

    /// Whether `fit` has completed
    fn is_fitted(&self) -> bool;
}

pub mod boosting;

pub use self::boosting::{BoosterParams, GbdtRegressor};
