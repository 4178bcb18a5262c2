//! Train the sales forecaster and save it next to the dataset.

use anyhow::Context;
use clap::Parser;
use sales_forecast::data::{parse_date, predictions_to_dataframe, DataLoader};
use sales_forecast::features::encode_data;
use sales_forecast::forecast::{ForecastConfig, Forecaster};
use sales_forecast::store::save_model;
use sales_forecast::Paths;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Horizon and start date of the `--preview` forecast
const PREVIEW_HORIZON: usize = 10;
const PREVIEW_DATE: &str = "2023-12-10";

#[derive(Parser)]
#[command(name = "sales_train")]
#[command(about = "Fit the sales forecaster and save it", long_about = None)]
struct Args {
    /// Dataset file (.parquet or .csv), defaults to data/files/data.parquet
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output model file, defaults to data/files/model.json
    #[arg(long)]
    model: Option<PathBuf>,

    /// Report accuracy of forecasting from the cutoff date
    #[arg(long)]
    evaluate: bool,

    /// Print a sample forecast for this store
    #[arg(long)]
    preview: Option<String>,

    /// Log level filter
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    let paths = Paths::from_cwd()?
        .with_data_path(args.data)
        .with_model_path(args.model);

    let data = DataLoader::from_path(&paths.data_path)
        .with_context(|| format!("failed to load {}", paths.data_path.display()))?;
    let (encoder, encoded) = encode_data(&data.sales)?;

    let forecaster = Forecaster::new(ForecastConfig::default())?;
    let (train, val) = forecaster.split(&encoded);
    info!(
        train_rows = train.len(),
        val_rows = val.len(),
        cutoff = %forecaster.config().cutoff,
        "split dataset"
    );

    let model = forecaster.fit(encoder, &train)?;

    if args.evaluate {
        let metrics = model.evaluate(&val, forecaster.config().cutoff)?;
        println!("{}", metrics);
    }

    if let Some(store_id) = args.preview {
        let pred_date = parse_date(PREVIEW_DATE)?;
        let predictions = model.predict(PREVIEW_HORIZON, &val, &data.catalog, pred_date, &store_id)?;
        println!("{}", predictions_to_dataframe(&predictions)?);
    }

    save_model(&model, &paths.model_path)?;
    println!("model saved in {}", paths.model_path.display());

    Ok(())
}
