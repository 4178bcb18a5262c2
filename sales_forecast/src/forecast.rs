//! Multi-series forecasting with one shared regressor
//!
//! Every (product, store) series contributes rows to a single regression
//! problem. A row's predictors are lags of the target, rolling aggregates of a
//! lagged target, calendar fields of the row's date and the encoded ids of its
//! series. Forecasting is recursive: each predicted day is appended to the
//! series history before the next day's features are built.

use crate::data::CatalogEntry;
use crate::error::{ForecastError, Result};
use crate::features::{split_series_key, EncodedRecord, SeriesEncoder};
use crate::metrics::{evaluate_forecast, ErrorMetrics};
use crate::models::{BoosterParams, GbdtRegressor, Regressor};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use sales_math::calendar::DateFeature;
use sales_math::window::{lag_value, lagged_rolling, WindowStat};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Rolling aggregate over a lagged target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagTransform {
    pub lag: usize,
    pub window: usize,
    pub stat: WindowStat,
}

impl LagTransform {
    pub fn new(lag: usize, window: usize, stat: WindowStat) -> Self {
        Self { lag, window, stat }
    }

    pub fn name(&self) -> String {
        format!(
            "rolling_{}_lag{}_window_size{}",
            self.stat.name(),
            self.lag,
            self.window
        )
    }

    /// Observations needed before the transform is defined
    pub fn min_history(&self) -> usize {
        self.lag + self.window - 1
    }

    pub fn evaluate(&self, history: &[f64]) -> Option<f64> {
        lagged_rolling(history, self.lag, self.window, self.stat)
    }
}

/// Forecaster settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Target lags used as predictors
    pub lags: Vec<usize>,
    /// Rolling aggregates over lagged targets
    pub lag_transforms: Vec<LagTransform>,
    /// Calendar fields of the predicted date
    pub date_features: Vec<DateFeature>,
    /// Worker threads for feature construction
    pub num_threads: usize,
    /// Training rows are strictly before this date
    pub cutoff: NaiveDate,
    /// Regressor hyperparameters
    pub booster: BoosterParams,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 7, 14],
            lag_transforms: vec![
                LagTransform::new(1, 7, WindowStat::Mean),
                LagTransform::new(1, 7, WindowStat::Max),
                LagTransform::new(1, 7, WindowStat::Min),
            ],
            date_features: vec![
                DateFeature::DayOfWeek,
                DateFeature::DayOfYear,
                DateFeature::Week,
            ],
            num_threads: 6,
            cutoff: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap_or_default(),
            booster: BoosterParams::default(),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lags.is_empty() && self.lag_transforms.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one lag or lag transform is required".to_string(),
            ));
        }
        if self.lags.contains(&0) {
            return Err(ForecastError::InvalidParameter(
                "Lags must be positive".to_string(),
            ));
        }
        if self.lag_transforms.iter().any(|t| t.lag == 0 || t.window == 0) {
            return Err(ForecastError::InvalidParameter(
                "Lag transforms need a positive lag and window".to_string(),
            ));
        }
        if self.num_threads == 0 {
            return Err(ForecastError::InvalidParameter(
                "num_threads must be positive".to_string(),
            ));
        }
        self.booster.validate()
    }

    /// Column names in feature-row order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lags.iter().map(|lag| format!("lag{}", lag)).collect();
        names.extend(self.lag_transforms.iter().map(LagTransform::name));
        names.extend(self.date_features.iter().map(|f| f.name().to_string()));
        names.push("sale_id".to_string());
        names.push("store_id".to_string());
        names
    }

    /// Observations a series needs before every feature is defined
    pub fn min_history(&self) -> usize {
        let lags = self.lags.iter().copied().max().unwrap_or(0);
        let transforms = self
            .lag_transforms
            .iter()
            .map(LagTransform::min_history)
            .max()
            .unwrap_or(0);
        lags.max(transforms)
    }

    /// Predictors of the value following `history`, dated `date`
    fn feature_row(&self, history: &[f64], date: NaiveDate, sale_id: u32, store_id: u32) -> Option<Vec<f64>> {
        let mut row = Vec::with_capacity(self.lags.len() + self.lag_transforms.len() + self.date_features.len() + 2);
        for lag in &self.lags {
            row.push(lag_value(history, *lag)?);
        }
        for transform in &self.lag_transforms {
            row.push(transform.evaluate(history)?);
        }
        row.extend(self.date_features.iter().map(|f| f.value(date)));
        row.push(f64::from(sale_id));
        row.push(f64::from(store_id));
        Some(row)
    }
}

/// One series with its observations in date order
#[derive(Debug, Clone)]
struct SeriesHistory {
    unique_id: String,
    sale_id: u32,
    store_id: u32,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

fn group_series<'a, I>(records: I) -> Vec<SeriesHistory>
where
    I: IntoIterator<Item = &'a EncodedRecord>,
{
    let mut grouped: BTreeMap<&str, Vec<&EncodedRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.unique_id.as_str()).or_default().push(record);
    }

    grouped
        .into_values()
        .map(|mut rows| {
            rows.sort_by_key(|r| r.sale_date);
            SeriesHistory {
                unique_id: rows[0].unique_id.clone(),
                sale_id: rows[0].sale_id,
                store_id: rows[0].store_id,
                dates: rows.iter().map(|r| r.sale_date).collect(),
                values: rows.iter().map(|r| r.sale_amount).collect(),
            }
        })
        .collect()
}

fn thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| ForecastError::ModelError(format!("Failed to build thread pool: {}", e)))
}

/// Untrained forecaster
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Training rows (strictly before the cutoff) and validation rows (all)
    pub fn split(&self, records: &[EncodedRecord]) -> (Vec<EncodedRecord>, Vec<EncodedRecord>) {
        let train = records
            .iter()
            .filter(|r| r.sale_date < self.config.cutoff)
            .cloned()
            .collect();
        (train, records.to_vec())
    }

    /// Fit the default gradient boosted regressor
    pub fn fit(&self, encoder: SeriesEncoder, records: &[EncodedRecord]) -> Result<TrainedForecaster> {
        let regressor = GbdtRegressor::new(self.config.booster.clone())?;
        self.fit_with(regressor, encoder, records)
    }

    /// Fit a caller-supplied regressor
    pub fn fit_with<R: Regressor>(
        &self,
        mut regressor: R,
        encoder: SeriesEncoder,
        records: &[EncodedRecord],
    ) -> Result<TrainedForecaster<R>> {
        let series = group_series(records);
        let pool = thread_pool(self.config.num_threads)?;
        let config = &self.config;

        let rows: Vec<(Vec<f64>, f64)> = pool.install(|| {
            series
                .par_iter()
                .flat_map_iter(|s| {
                    (0..s.values.len()).filter_map(move |i| {
                        config
                            .feature_row(&s.values[..i], s.dates[i], s.sale_id, s.store_id)
                            .map(|row| (row, s.values[i]))
                    })
                })
                .collect()
        });

        if rows.is_empty() {
            return Err(ForecastError::ModelError(format!(
                "No training rows: every series is shorter than {} observations",
                config.min_history() + 1
            )));
        }

        info!(
            series = series.len(),
            rows = rows.len(),
            model = regressor.name(),
            "fitting forecaster"
        );

        let (features, targets): (Vec<Vec<f64>>, Vec<f64>) = rows.into_iter().unzip();
        regressor.fit(&features, &targets)?;

        Ok(TrainedForecaster {
            config: self.config.clone(),
            encoder,
            regressor,
        })
    }
}

/// Forecast of one series on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub unique_id: String,
    pub sale_date: NaiveDate,
    pub value: f64,
}

/// A forecast joined with its decoded ids and catalog fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub unique_id: String,
    pub sale_date: NaiveDate,
    pub predicted_amount: f64,
    pub sale_id: String,
    pub store_id: String,
    pub sale_name: Option<String>,
    pub sub_family_name: Option<String>,
    pub family_name: Option<String>,
}

/// Parameters that identify a trained forecaster's behaviour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastParams {
    pub regressor: String,
    pub feature_names: Vec<String>,
    pub config: ForecastConfig,
}

/// Fitted forecaster with the id encoders it was trained with
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedForecaster<R = GbdtRegressor> {
    config: ForecastConfig,
    encoder: SeriesEncoder,
    regressor: R,
}

impl<R: Regressor> TrainedForecaster<R> {
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn encoder(&self) -> &SeriesEncoder {
        &self.encoder
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    pub fn params(&self) -> ForecastParams {
        ForecastParams {
            regressor: self.regressor.name().to_string(),
            feature_names: self.config.feature_names(),
            config: self.config.clone(),
        }
    }

    /// Forecast `horizon` daily steps after the last observation of every series.
    ///
    /// Series shorter than the longest lag or window produce nothing.
    pub fn forecast<'a, I>(&self, horizon: usize, history: I) -> Result<Vec<Forecast>>
    where
        I: IntoIterator<Item = &'a EncodedRecord>,
    {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be positive".to_string(),
            ));
        }

        let min_history = self.config.min_history();
        let (mut series, skipped): (Vec<SeriesHistory>, Vec<SeriesHistory>) = group_series(history)
            .into_iter()
            .partition(|s| s.values.len() >= min_history);
        if !skipped.is_empty() {
            debug!(
                skipped = skipped.len(),
                min_history, "series with too little history are not forecast"
            );
        }

        let mut forecasts = Vec::new();
        for step in 1..=horizon {
            let mut dates = Vec::with_capacity(series.len());
            let mut rows = Vec::with_capacity(series.len());
            for s in &series {
                let last = s.dates.last().copied().unwrap_or_default();
                let date = last.checked_add_days(Days::new(step as u64)).ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "Forecast date {} days after {} is out of range",
                        step, last
                    ))
                })?;
                let row = self
                    .config
                    .feature_row(&s.values, date, s.sale_id, s.store_id)
                    .ok_or_else(|| {
                        ForecastError::ModelError(format!("Undefined features for {}", s.unique_id))
                    })?;
                dates.push(date);
                rows.push(row);
            }

            let predicted = self.regressor.predict(&rows)?;
            for ((s, date), value) in series.iter_mut().zip(dates).zip(predicted) {
                s.values.push(value);
                forecasts.push(Forecast {
                    unique_id: s.unique_id.clone(),
                    sale_date: date,
                    value,
                });
            }
        }

        forecasts.sort_by(|a, b| {
            a.unique_id
                .cmp(&b.unique_id)
                .then(a.sale_date.cmp(&b.sale_date))
        });
        Ok(forecasts)
    }

    /// Forecast one store from `pred_date` on.
    ///
    /// Only history strictly before `pred_date` is used, and only forecasts
    /// dated on or after it are returned.
    pub fn predict(
        &self,
        horizon: usize,
        history: &[EncodedRecord],
        catalog: &[CatalogEntry],
        pred_date: NaiveDate,
        store_id: &str,
    ) -> Result<Vec<PredictionRecord>> {
        let store_history = history.iter().filter(|r| {
            r.sale_date < pred_date
                && split_series_key(&r.unique_id).map(|(_, store)| store) == Some(store_id)
        });
        let forecasts = self.forecast(horizon, store_history)?;

        let mut by_sale: HashMap<&str, Vec<&CatalogEntry>> = HashMap::new();
        for entry in catalog {
            by_sale.entry(entry.sale_id.as_str()).or_default().push(entry);
        }

        let mut records = Vec::with_capacity(forecasts.len());
        for forecast in forecasts.into_iter().filter(|f| f.sale_date >= pred_date) {
            let (sale_id, store) = split_series_key(&forecast.unique_id).ok_or_else(|| {
                ForecastError::DataError(format!("Malformed series key '{}'", forecast.unique_id))
            })?;

            let record = PredictionRecord {
                unique_id: forecast.unique_id.clone(),
                sale_date: forecast.sale_date,
                predicted_amount: forecast.value,
                sale_id: sale_id.to_string(),
                store_id: store.to_string(),
                sale_name: None,
                sub_family_name: None,
                family_name: None,
            };

            match by_sale.get(sale_id) {
                Some(entries) => records.extend(entries.iter().map(|entry| PredictionRecord {
                    sale_name: Some(entry.sale_name.clone()),
                    sub_family_name: Some(entry.sub_family_name.clone()),
                    family_name: Some(entry.family_name.clone()),
                    ..record.clone()
                })),
                None => records.push(record),
            }
        }

        Ok(records)
    }

    /// Accuracy of forecasting every series from `start` to the end of `records`
    pub fn evaluate(&self, records: &[EncodedRecord], start: NaiveDate) -> Result<ErrorMetrics> {
        let last = records
            .iter()
            .map(|r| r.sale_date)
            .max()
            .filter(|last| *last >= start)
            .ok_or_else(|| {
                ForecastError::DataError(format!("No observations on or after {}", start))
            })?;
        let horizon = (last - start).num_days() as usize + 1;

        let forecasts = self.forecast(horizon, records.iter().filter(|r| r.sale_date < start))?;
        let predicted: HashMap<(&str, NaiveDate), f64> = forecasts
            .iter()
            .map(|f| ((f.unique_id.as_str(), f.sale_date), f.value))
            .collect();

        let (forecast, actual): (Vec<f64>, Vec<f64>) = records
            .iter()
            .filter(|r| r.sale_date >= start)
            .filter_map(|r| {
                predicted
                    .get(&(r.unique_id.as_str(), r.sale_date))
                    .map(|p| (*p, r.sale_amount))
            })
            .unzip();

        evaluate_forecast(&forecast, &actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForecastConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_history(), 14);
        assert_eq!(
            config.feature_names(),
            vec![
                "lag1",
                "lag7",
                "lag14",
                "rolling_mean_lag1_window_size7",
                "rolling_max_lag1_window_size7",
                "rolling_min_lag1_window_size7",
                "dayofweek",
                "dayofyear",
                "week",
                "sale_id",
                "store_id",
            ]
        );
    }

    #[test]
    fn test_feature_row_needs_full_history() {
        let config = ForecastConfig::default();
        let date = NaiveDate::from_ymd_opt(2023, 12, 10).unwrap();
        let history: Vec<f64> = (1..=13).map(f64::from).collect();
        assert!(config.feature_row(&history, date, 0, 0).is_none());

        let history: Vec<f64> = (1..=14).map(f64::from).collect();
        let row = config.feature_row(&history, date, 3, 1).unwrap();
        assert_eq!(row.len(), config.feature_names().len());
        assert_eq!(&row[..3], &[14.0, 8.0, 1.0]);
        // mean/max/min of 8..=14
        assert_eq!(&row[3..6], &[11.0, 14.0, 8.0]);
        assert_eq!(&row[6..9], &[6.0, 344.0, 49.0]);
        assert_eq!(&row[9..], &[3.0, 1.0]);
    }

    #[test]
    fn test_invalid_config() {
        let config = ForecastConfig {
            lags: vec![0],
            ..ForecastConfig::default()
        };
        assert!(Forecaster::new(config).is_err());

        let config = ForecastConfig {
            num_threads: 0,
            ..ForecastConfig::default()
        };
        assert!(Forecaster::new(config).is_err());
    }

    /// Predicts the mean target seen at fit time
    #[derive(Debug, Default)]
    struct MeanRegressor {
        mean: Option<f64>,
    }

    impl Regressor for MeanRegressor {
        fn fit(&mut self, _features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
            self.mean = Some(targets.iter().sum::<f64>() / targets.len() as f64);
            Ok(())
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
            let mean = self
                .mean
                .ok_or_else(|| ForecastError::ModelError("Model is not fitted".to_string()))?;
            Ok(vec![mean; features.len()])
        }

        fn name(&self) -> &str {
            "MeanRegressor"
        }

        fn is_fitted(&self) -> bool {
            self.mean.is_some()
        }
    }

    fn records_ending_on(last: NaiveDate, days: u64) -> Vec<EncodedRecord> {
        (0..days)
            .map(|offset| EncodedRecord {
                unique_id: "a|s".to_string(),
                sale_date: last.checked_sub_days(Days::new(days - 1 - offset)).unwrap(),
                sale_amount: 2.0,
                sale_id: 0,
                store_id: 0,
            })
            .collect()
    }

    #[test]
    fn test_forecast_past_last_representable_date() {
        let last = NaiveDate::MAX.checked_sub_days(Days::new(1)).unwrap();
        let records = records_ending_on(last, 20);
        let (encoder, _) = crate::features::encode_data(&[]).unwrap();
        let forecaster = Forecaster::new(ForecastConfig::default()).unwrap();
        let model = forecaster
            .fit_with(MeanRegressor::default(), encoder, &records)
            .unwrap();

        let forecasts = model.forecast(1, &records).unwrap();
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].sale_date, NaiveDate::MAX);
        assert_eq!(forecasts[0].value, 2.0);

        assert!(matches!(
            model.forecast(2, &records),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ForecastConfig = serde_json::from_str(r#"{"num_threads": 2}"#).unwrap();
        assert_eq!(config.num_threads, 2);
        assert_eq!(config.lags, vec![1, 7, 14]);
    }
}
