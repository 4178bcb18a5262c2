//! Sales dataset loading

use crate::error::{ForecastError, Result};
use crate::forecast::PredictionRecord;
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::hash::Hash;
use std::path::Path;
use tracing::{debug, info};

pub const SALE_DATE: &str = "sale_date";
pub const SALE_ID: &str = "sale_id";
pub const STORE_ID: &str = "store_id";
pub const SALE_AMOUNT: &str = "sale_amount";
pub const SALE_NAME: &str = "sale_name";
pub const SUB_FAMILY_NAME: &str = "sub_family_name";
pub const FAMILY_NAME: &str = "family_name";

/// Columns every input file must provide
pub const REQUIRED_COLUMNS: [&str; 7] = [
    SALE_DATE,
    SALE_ID,
    STORE_ID,
    SALE_AMOUNT,
    SALE_NAME,
    SUB_FAMILY_NAME,
    FAMILY_NAME,
];

/// One observed sale of a product at a store on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub sale_date: NaiveDate,
    pub sale_id: String,
    pub store_id: String,
    pub sale_amount: f64,
}

/// Descriptive metadata of a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub sale_id: String,
    pub sale_name: String,
    pub sub_family_name: String,
    pub family_name: String,
}

/// Display name of a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleName {
    pub sale_id: String,
    pub sale_name: String,
}

/// The three tables split out of a sales dataset
#[derive(Debug, Clone, Default)]
pub struct SalesData {
    /// Deduplicated product catalog
    pub catalog: Vec<CatalogEntry>,
    /// Time-series rows
    pub sales: Vec<SalesRecord>,
    /// Deduplicated sale id to display name mapping
    pub sale_id_to_name: Vec<SaleName>,
}

impl SalesData {
    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    /// Display name of a product, first mapping wins
    pub fn sale_name(&self, sale_id: &str) -> Option<&str> {
        self.sale_id_to_name
            .iter()
            .find(|entry| entry.sale_id == sale_id)
            .map(|entry| entry.sale_name.as_str())
    }
}

/// Data loader for sales datasets
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a dataset, choosing the reader from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<SalesData> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("parquet") => Self::from_parquet(path),
            Some("csv") => Self::from_csv(path),
            _ => Err(ForecastError::DataError(format!(
                "Unsupported data file '{}', expected .parquet or .csv",
                path.display()
            ))),
        }
    }

    /// Load a dataset from a Parquet file
    pub fn from_parquet<P: AsRef<Path>>(path: P) -> Result<SalesData> {
        let path = path.as_ref();
        info!(path = %path.display(), "reading parquet dataset");
        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;

        Self::from_dataframe(df)
    }

    /// Load a dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<SalesData> {
        let path = path.as_ref();
        info!(path = %path.display(), "reading csv dataset");
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Split an in-memory DataFrame into catalog, sales and name tables
    pub fn from_dataframe(df: DataFrame) -> Result<SalesData> {
        Self::check_columns(&df)?;

        let dates = date_column(&df, SALE_DATE)?;
        let sale_ids = string_column(&df, SALE_ID)?;
        let store_ids = string_column(&df, STORE_ID)?;
        let amounts = f64_column(&df, SALE_AMOUNT)?;
        let sale_names = string_column(&df, SALE_NAME)?;
        let sub_families = string_column(&df, SUB_FAMILY_NAME)?;
        let families = string_column(&df, FAMILY_NAME)?;

        let catalog = dedup(
            sale_ids
                .iter()
                .zip(&sale_names)
                .zip(sub_families.iter().zip(&families))
                .map(|((sale_id, sale_name), (sub_family_name, family_name))| CatalogEntry {
                    sale_id: sale_id.clone(),
                    sale_name: sale_name.clone(),
                    sub_family_name: sub_family_name.clone(),
                    family_name: family_name.clone(),
                }),
        );

        let sale_id_to_name = dedup(sale_ids.iter().zip(&sale_names).map(|(sale_id, sale_name)| {
            SaleName {
                sale_id: sale_id.clone(),
                sale_name: sale_name.clone(),
            }
        }));

        let sales: Vec<SalesRecord> = dates
            .into_iter()
            .zip(sale_ids)
            .zip(store_ids)
            .zip(amounts)
            .map(|(((sale_date, sale_id), store_id), sale_amount)| SalesRecord {
                sale_date,
                sale_id,
                store_id,
                sale_amount,
            })
            .collect();

        debug!(
            rows = sales.len(),
            catalog = catalog.len(),
            names = sale_id_to_name.len(),
            "split sales dataset"
        );

        Ok(SalesData {
            catalog,
            sales,
            sale_id_to_name,
        })
    }

    fn check_columns(df: &DataFrame) -> Result<()> {
        let column_names = df.get_column_names();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| !column_names.contains(required))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ForecastError::DataError(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Keep the first occurrence of every distinct row
fn dedup<T, I>(rows: I) -> Vec<T>
where
    T: Clone + Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

fn null_error(column: &str, row: usize) -> ForecastError {
    ForecastError::DataError(format!("Null value in column '{}' at row {}", column, row))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df.column(name)?.cast(&DataType::Utf8)?;
    series
        .utf8()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.map(str::to_string).ok_or_else(|| null_error(name, row)))
        .collect()
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df.column(name)?;
    if !col.dtype().is_numeric() {
        return Err(ForecastError::DataError(format!(
            "Column '{}' cannot be converted to f64",
            name
        )));
    }

    let series = col.cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.ok_or_else(|| null_error(name, row)))
        .collect()
}

fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let col = df.column(name)?;

    match col.dtype() {
        DataType::Utf8 => col
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value.ok_or_else(|| null_error(name, row))?;
                parse_date(value.get(..10).unwrap_or(value)).map_err(|_| {
                    ForecastError::DataError(format!(
                        "Invalid date '{}' in column '{}' at row {}",
                        value, name, row
                    ))
                })
            })
            .collect(),
        DataType::Date | DataType::Datetime(_, _) => {
            let days = col.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
                .ok_or_else(|| ForecastError::DataError("Invalid epoch".to_string()))?;
            days.i32()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let days = value.ok_or_else(|| null_error(name, row))?;
                    epoch
                        .checked_add_signed(Duration::days(i64::from(days)))
                        .ok_or_else(|| {
                            ForecastError::DataError(format!(
                                "Date out of range in column '{}' at row {}",
                                name, row
                            ))
                        })
                })
                .collect()
        }
        other => Err(ForecastError::DataError(format!(
            "Column '{}' has type {} and cannot be read as a date",
            name, other
        ))),
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> chrono::ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

/// Tabular view of prediction records, one row per series and date
pub fn predictions_to_dataframe(records: &[PredictionRecord]) -> Result<DataFrame> {
    let unique_ids: Vec<String> = records.iter().map(|r| r.unique_id.clone()).collect();
    let dates: Vec<String> = records
        .iter()
        .map(|r| r.sale_date.format("%Y-%m-%d").to_string())
        .collect();
    let amounts: Vec<f64> = records.iter().map(|r| r.predicted_amount).collect();
    let sale_ids: Vec<String> = records.iter().map(|r| r.sale_id.clone()).collect();
    let store_ids: Vec<String> = records.iter().map(|r| r.store_id.clone()).collect();
    let names: Vec<Option<String>> = records.iter().map(|r| r.sale_name.clone()).collect();
    let sub_families: Vec<Option<String>> =
        records.iter().map(|r| r.sub_family_name.clone()).collect();
    let families: Vec<Option<String>> = records.iter().map(|r| r.family_name.clone()).collect();

    let df = DataFrame::new(vec![
        Series::new("unique_id", unique_ids),
        Series::new(SALE_DATE, dates),
        Series::new("predicted_amount", amounts),
        Series::new(SALE_ID, sale_ids),
        Series::new(STORE_ID, store_ids),
        Series::new(SALE_NAME, names),
        Series::new(SUB_FAMILY_NAME, sub_families),
        Series::new(FAMILY_NAME, families),
    ])?;

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df!(
            SALE_DATE => &["2023-01-01", "2023-01-01", "2023-01-02", "2023-01-02"],
            SALE_ID => &["a", "b", "a", "b"],
            STORE_ID => &["s1", "s1", "s1", "s2"],
            SALE_AMOUNT => &[1.0, 2.0, 3.0, 4.0],
            SALE_NAME => &["Apple", "Bread", "Apple", "Bread"],
            SUB_FAMILY_NAME => &["Fruit", "Bakery", "Fruit", "Bakery"],
            FAMILY_NAME => &["Fresh", "Fresh", "Fresh", "Fresh"]
        )
        .unwrap()
    }

    #[test]
    fn test_from_dataframe_splits_tables() {
        let data = DataLoader::from_dataframe(sample_frame()).unwrap();

        assert_eq!(data.len(), 4);
        assert_eq!(data.catalog.len(), 2);
        assert_eq!(data.sale_id_to_name.len(), 2);
        assert_eq!(data.sale_name("b"), Some("Bread"));
        assert_eq!(data.sale_name("zz"), None);
        assert_eq!(data.sales[2].sale_date, parse_date("2023-01-02").unwrap());
        assert_eq!(data.sales[3].store_id, "s2");
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let df = sample_frame().drop(FAMILY_NAME).unwrap();
        let err = DataLoader::from_dataframe(df).unwrap_err();
        assert!(err.to_string().contains(FAMILY_NAME));
    }

    #[test]
    fn test_numeric_ids_are_read_as_strings() {
        let df = df!(
            SALE_DATE => &["2023-01-01"],
            SALE_ID => &[42i64],
            STORE_ID => &[7i64],
            SALE_AMOUNT => &[3i64],
            SALE_NAME => &["Milk"],
            SUB_FAMILY_NAME => &["Dairy"],
            FAMILY_NAME => &["Fresh"]
        )
        .unwrap();

        let data = DataLoader::from_dataframe(df).unwrap();
        assert_eq!(data.sales[0].sale_id, "42");
        assert_eq!(data.sales[0].store_id, "7");
        assert_eq!(data.sales[0].sale_amount, 3.0);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let df = df!(
            SALE_DATE => &["not a date"],
            SALE_ID => &["a"],
            STORE_ID => &["s1"],
            SALE_AMOUNT => &[1.0],
            SALE_NAME => &["Apple"],
            SUB_FAMILY_NAME => &["Fruit"],
            FAMILY_NAME => &["Fresh"]
        )
        .unwrap();

        assert!(matches!(
            DataLoader::from_dataframe(df),
            Err(ForecastError::DataError(_))
        ));
    }

    #[test]
    fn test_predictions_to_dataframe() {
        let records = vec![PredictionRecord {
            unique_id: "a|s1".to_string(),
            sale_date: parse_date("2023-12-10").unwrap(),
            predicted_amount: 2.5,
            sale_id: "a".to_string(),
            store_id: "s1".to_string(),
            sale_name: Some("Apple".to_string()),
            sub_family_name: None,
            family_name: None,
        }];

        let df = predictions_to_dataframe(&records).unwrap();
        assert_eq!(df.shape(), (1, 8));
        assert_eq!(df.column(SALE_DATE).unwrap().utf8().unwrap().get(0), Some("2023-12-10"));
        assert_eq!(df.column(SUB_FAMILY_NAME).unwrap().null_count(), 1);
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            DataLoader::from_path("sales.xlsx"),
            Err(ForecastError::DataError(_))
        ));
    }
}
