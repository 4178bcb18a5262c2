//! # sales_api
//!
//! Serves `POST /predict` with the trained model found under `data/files`.

use anyhow::Context;
use clap::Parser;
use sales_forecast::{Paths, PredictionService};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sales_api")]
#[command(about = "Serve sales predictions over HTTP", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Log level filter
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "{},tower_http={}",
            args.log_level, args.log_level
        )))
        .init();

    let paths = Paths::from_cwd()?;
    let service = tokio::task::spawn_blocking(move || PredictionService::from_paths(&paths))
        .await?
        .context("failed to load the model and dataset")?;

    let app = sales_api::app(Arc::new(service));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid address {}:{}", args.host, args.port))?;

    tracing::info!("sales_api v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
