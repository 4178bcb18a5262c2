//! Series keys, categorical encoding and calendar features

use crate::data::SalesRecord;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use sales_math::calendar::CalendarUnit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator between sale id and store id in a series key
pub const SERIES_SEPARATOR: &str = "|";

/// Key of the (product, store) time series
pub fn series_key(sale_id: &str, store_id: &str) -> String {
    format!("{}{}{}", sale_id, SERIES_SEPARATOR, store_id)
}

/// Split a series key back into `(sale_id, store_id)`
pub fn split_series_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(SERIES_SEPARATOR)
}

/// Maps labels to dense codes `0..n` in sorted label order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the distinct labels of `labels`
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = labels.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// Code of a label seen during fitting
    pub fn transform(&self, label: &str) -> Result<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .map(|code| code as u32)
            .map_err(|_| ForecastError::EncodingError(format!("Unseen label '{}'", label)))
    }

    /// Label of a code
    pub fn inverse_transform(&self, code: u32) -> Result<&str> {
        self.classes
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| ForecastError::EncodingError(format!("Unknown code {}", code)))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// A sales row keyed by series with encoded identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedRecord {
    pub unique_id: String,
    pub sale_date: NaiveDate,
    pub sale_amount: f64,
    pub sale_id: u32,
    pub store_id: u32,
}

/// Fitted encoders for sale and store identifiers.
///
/// A trained model captures this state so prediction encodes ids exactly as
/// training did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEncoder {
    sale: LabelEncoder,
    store: LabelEncoder,
}

impl SeriesEncoder {
    pub fn fit(records: &[SalesRecord]) -> Self {
        Self {
            sale: LabelEncoder::fit(records.iter().map(|r| r.sale_id.as_str())),
            store: LabelEncoder::fit(records.iter().map(|r| r.store_id.as_str())),
        }
    }

    /// Encode rows; ids unseen at fit time or containing the key separator fail
    pub fn transform(&self, records: &[SalesRecord]) -> Result<Vec<EncodedRecord>> {
        records
            .iter()
            .map(|record| {
                check_separator(&record.sale_id)?;
                check_separator(&record.store_id)?;
                Ok(EncodedRecord {
                    unique_id: series_key(&record.sale_id, &record.store_id),
                    sale_date: record.sale_date,
                    sale_amount: record.sale_amount,
                    sale_id: self.sale.transform(&record.sale_id)?,
                    store_id: self.store.transform(&record.store_id)?,
                })
            })
            .collect()
    }

    pub fn sale(&self) -> &LabelEncoder {
        &self.sale
    }

    pub fn store(&self) -> &LabelEncoder {
        &self.store
    }
}

fn check_separator(id: &str) -> Result<()> {
    if id.contains(SERIES_SEPARATOR) {
        return Err(ForecastError::EncodingError(format!(
            "Identifier '{}' contains the series separator '{}'",
            id, SERIES_SEPARATOR
        )));
    }
    Ok(())
}

/// Build series keys and encode sale/store ids with freshly fitted encoders
pub fn encode_data(records: &[SalesRecord]) -> Result<(SeriesEncoder, Vec<EncodedRecord>)> {
    let encoder = SeriesEncoder::fit(records);
    let encoded = encoder.transform(records)?;
    Ok((encoder, encoded))
}

/// Named sine/cosine columns aligned with the input dates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CyclicalFeatures {
    columns: Vec<(String, Vec<f64>)>,
}

impl CyclicalFeatures {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Cyclical encoding of calendar features.
///
/// Adds `{unit}_sin` and `{unit}_cos` for every requested unit. All names are
/// checked before any value is computed.
pub fn add_cyclical_calendar_features(
    dates: &[NaiveDate],
    features: &[&str],
) -> Result<CyclicalFeatures> {
    let units = features
        .iter()
        .map(|name| name.parse::<CalendarUnit>())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut columns = Vec::with_capacity(units.len() * 2);
    for unit in units {
        let (sin, cos): (Vec<f64>, Vec<f64>) = dates.iter().map(|date| unit.encode(*date)).unzip();
        columns.push((format!("{}_sin", unit), sin));
        columns.push((format!("{}_cos", unit), cos));
    }

    Ok(CyclicalFeatures { columns })
}
