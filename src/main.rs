//! # sales-forecast
//!
//! Launches one part of the application as its own process:
//!
//! - `train`: fit the model and save it under `data/files`
//! - `back`: serve predictions over HTTP
//! - `front`: query the prediction service from the terminal
//!
//! Arguments after the mode are forwarded to the launched program.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitCode};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Train,
    Back,
    Front,
}

impl Mode {
    /// Executable built alongside this one for the mode
    fn program(self) -> &'static str {
        match self {
            Mode::Train => "sales_train",
            Mode::Back => "sales_api",
            Mode::Front => "sales_front",
        }
    }
}

#[derive(Parser)]
#[command(name = "sales-forecast")]
#[command(about = "Sales forecasting: training, prediction service and client", long_about = None)]
struct Cli {
    #[arg(value_enum)]
    mode: Mode,

    /// Arguments for the launched program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

fn sibling_executable(name: &str) -> anyhow::Result<PathBuf> {
    let current_exe = std::env::current_exe().context("failed to determine executable path")?;
    let bin_dir = current_exe
        .parent()
        .context("failed to resolve executable directory")?;
    Ok(bin_dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX)))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let program = sibling_executable(cli.mode.program())?;
    tracing::info!(mode = ?cli.mode, program = %program.display(), "launching");

    let status = Command::new(&program)
        .args(&cli.args)
        .status()
        .with_context(|| format!("failed to start {}", program.display()))?;

    if !status.success() {
        tracing::warn!(%status, "{} exited with failure", cli.mode.program());
    }

    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
