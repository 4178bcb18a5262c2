#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use sales_forecast::data::{DataLoader, SalesData};
use sales_forecast::forecast::ForecastConfig;
use sales_forecast::models::BoosterParams;
use std::path::Path;

pub const STORE_A: &str = "c8c368f0311ea25b581cb3c704fe3a70";
pub const STORE_B: &str = "1354820366865ba193741390bba9d17b";

/// Sold in both stores over the whole period
pub const PRODUCTS: [(&str, &str, &str, &str); 3] = [
    ("3f1e7c", "Whole Milk 1L", "Milk", "Dairy"),
    ("9a02bd", "Sourdough Loaf", "Bread", "Bakery"),
    ("c41d55", "Gala Apples", "Fruit", "Fresh"),
];

/// Only sold in store B, and only from mid December
pub const LATE_PRODUCT: (&str, &str, &str, &str) = ("e77a10", "Eggnog", "Seasonal", "Dairy");

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Daily sales from 2023-09-01 to 2023-12-31 with a weekly pattern
pub fn sample_frame() -> DataFrame {
    let mut dates = Vec::new();
    let mut sale_ids = Vec::new();
    let mut store_ids = Vec::new();
    let mut amounts = Vec::new();
    let mut names = Vec::new();
    let mut sub_families = Vec::new();
    let mut families = Vec::new();

    let mut push = |day: NaiveDate, product: (&str, &str, &str, &str), store: &str, amount: f64| {
        dates.push(day.format("%Y-%m-%d").to_string());
        sale_ids.push(product.0.to_string());
        store_ids.push(store.to_string());
        amounts.push(amount);
        names.push(product.1.to_string());
        sub_families.push(product.2.to_string());
        families.push(product.3.to_string());
    };

    let start = date("2023-09-01");
    for offset in 0..122 {
        let day = start + Duration::days(offset);
        let weekly = [1.0, 1.2, 0.9, 1.1, 1.5, 2.0, 0.5][(offset % 7) as usize];
        for (p, product) in PRODUCTS.iter().enumerate() {
            for (s, store) in [STORE_A, STORE_B].into_iter().enumerate() {
                let base = 5.0 + 3.0 * p as f64 + 2.0 * s as f64;
                let amount = (base * weekly + ((offset * 7 + p as i64) % 3) as f64).round();
                push(day, *product, store, amount);
            }
        }
        if day >= date("2023-12-15") {
            push(day, LATE_PRODUCT, STORE_B, 4.0);
        }
    }

    df!(
        "sale_date" => dates,
        "sale_id" => sale_ids,
        "store_id" => store_ids,
        "sale_amount" => amounts,
        "sale_name" => names,
        "sub_family_name" => sub_families,
        "family_name" => families
    )
    .unwrap()
}

pub fn sample_data() -> SalesData {
    DataLoader::from_dataframe(sample_frame()).unwrap()
}

pub fn write_parquet(path: &Path) {
    let mut df = sample_frame();
    let mut file = std::fs::File::create(path).unwrap();
    ParquetWriter::new(&mut file).finish(&mut df).unwrap();
}

pub fn write_csv(path: &Path) {
    let mut df = sample_frame();
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).has_header(true).finish(&mut df).unwrap();
}

/// Default features with a smaller booster to keep tests fast
pub fn test_config() -> ForecastConfig {
    ForecastConfig {
        num_threads: 2,
        booster: BoosterParams {
            n_estimators: 20,
            max_depth: 4,
            learning_rate: 0.3,
            min_leaf_size: 1,
        },
        ..ForecastConfig::default()
    }
}
