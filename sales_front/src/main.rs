//! # sales_front
//!
//! Ask the prediction service for a list of products and print one line each.

use anyhow::Context;
use clap::Parser;
use sales_forecast::PredictionRequest;
use sales_front::{
    parse_date, parse_horizon, parse_sale_ids, render_outcome, resolve_store, PredictClient,
    DEFAULT_SERVER, STORE_OPTIONS,
};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sales_front")]
#[command(about = "Sales prediction client", long_about = None)]
struct Args {
    /// Prediction service address
    #[arg(long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Store id or its number in the store list
    #[arg(long)]
    store: Option<String>,

    /// Prediction date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Number of days to predict
    #[arg(long)]
    horizon: Option<String>,

    /// Comma-separated sale ids
    #[arg(long)]
    sale_ids: Option<String>,

    /// Log level filter
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Use `value` if given, otherwise ask on stdin until `parse` accepts the answer
fn read_input<T, E, F>(value: Option<String>, prompt: &str, parse: F) -> anyhow::Result<T>
where
    F: Fn(&str) -> Result<T, E>,
    E: std::fmt::Display,
{
    if let Some(value) = value {
        return parse(&value).map_err(|e| anyhow::anyhow!("{}", e));
    }

    let stdin = io::stdin();
    loop {
        print!("{}: ", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            anyhow::bail!("no input for {}", prompt);
        }
        match parse(&line) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => println!("{}", e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .with_writer(io::stderr)
        .init();

    println!("Sales Prediction");
    if args.store.is_none() {
        for (i, store) in STORE_OPTIONS.iter().enumerate() {
            println!("  {}. {}", i + 1, store);
        }
    }

    let store_id = read_input(args.store, "Select a store", resolve_store)?;
    let sale_date = read_input(args.date, "Prediction date (YYYY-MM-DD)", parse_date)?;
    let horizon = read_input(args.horizon, "Range (days)", parse_horizon)?;
    let sale_ids = read_input(args.sale_ids, "Sale IDs (comma-separated)", |s| {
        Ok::<_, std::convert::Infallible>(parse_sale_ids(s))
    })?;

    let client = PredictClient::new(&args.server).context("failed to build HTTP client")?;

    for sale_id in sale_ids {
        let request = PredictionRequest {
            store_id: store_id.to_string(),
            sale_date: sale_date.clone(),
            sale_id,
            horizon,
        };
        let outcome = client.predict(&request).await;
        println!("{}", render_outcome(&request.sale_id, &outcome));
    }

    Ok(())
}
