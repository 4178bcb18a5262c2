use chrono::{Duration, NaiveDate};
use sales_forecast::data::{predictions_to_dataframe, CatalogEntry, SaleName, SalesData, SalesRecord};
use sales_forecast::features::encode_data;
use sales_forecast::forecast::{ForecastConfig, Forecaster};

const STORES: [&str; 2] = ["north", "south"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sales Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    // Create sample data
    println!("Creating sample data...");
    let data = create_sample_data();
    println!(
        "Sample data created: {} sales rows, {} products\n",
        data.len(),
        data.catalog.len()
    );

    // Encode ids and split at the cutoff
    let (encoder, encoded) = encode_data(&data.sales)?;
    let forecaster = Forecaster::new(ForecastConfig::default())?;
    let (train, val) = forecaster.split(&encoded);

    println!("Training model on {} rows...", train.len());
    let model = forecaster.fit(encoder, &train)?;
    println!("Model trained with features {:?}\n", model.params().feature_names);

    // Forecast both stores
    let pred_date = NaiveDate::from_ymd_opt(2023, 12, 10).ok_or("invalid date")?;
    for store in STORES {
        let predictions = model.predict(7, &val, &data.catalog, pred_date, store)?;
        println!("Store {} from {}:", store, pred_date);
        println!("{}\n", predictions_to_dataframe(&predictions)?);
    }

    // Accuracy over December
    let metrics = model.evaluate(&val, forecaster.config().cutoff)?;
    println!("Validation: {}", metrics);

    Ok(())
}

fn create_sample_data() -> SalesData {
    let products = [("p1", "Butter", "Dairy"), ("p2", "Baguette", "Bakery")];
    let start = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
    let mut data = SalesData::default();

    for (i, (sale_id, name, family)) in products.iter().enumerate() {
        data.catalog.push(CatalogEntry {
            sale_id: sale_id.to_string(),
            sale_name: name.to_string(),
            sub_family_name: family.to_string(),
            family_name: family.to_string(),
        });
        data.sale_id_to_name.push(SaleName {
            sale_id: sale_id.to_string(),
            sale_name: name.to_string(),
        });

        for (s, store) in STORES.iter().enumerate() {
            for day in 0..122 {
                // Weekly cycle with a weekend peak
                let weekend = if day % 7 >= 5 { 6.0 } else { 0.0 };
                data.sales.push(SalesRecord {
                    sale_date: start + Duration::days(day),
                    sale_id: sale_id.to_string(),
                    store_id: store.to_string(),
                    sale_amount: 10.0 + 4.0 * i as f64 + 2.0 * s as f64 + weekend,
                });
            }
        }
    }

    data
}
