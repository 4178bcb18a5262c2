//! Persistence of trained forecasters

use crate::error::{ForecastError, Result};
use crate::forecast::TrainedForecaster;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Version written into every model file
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, R> {
    format_version: u32,
    model: &'a TrainedForecaster<R>,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

#[derive(Deserialize)]
struct Envelope<R> {
    model: TrainedForecaster<R>,
}

/// Write a trained forecaster, creating parent directories as needed
pub fn save_model<R, P>(model: &TrainedForecaster<R>, path: P) -> Result<()>
where
    R: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(
        &mut writer,
        &EnvelopeRef {
            format_version: FORMAT_VERSION,
            model,
        },
    )?;
    writer.flush()?;

    info!(path = %path.display(), "model saved");
    Ok(())
}

/// Read a forecaster written by [`save_model`]
pub fn load_model<R, P>(path: P) -> Result<TrainedForecaster<R>>
where
    R: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let probe: VersionProbe = serde_json::from_str(&contents)?;
    if probe.format_version != FORMAT_VERSION {
        return Err(ForecastError::FormatError(format!(
            "Unsupported model format version {} (expected {})",
            probe.format_version, FORMAT_VERSION
        )));
    }

    let envelope: Envelope<R> = serde_json::from_str(&contents)?;
    info!(path = %path.display(), "model loaded");
    Ok(envelope.model)
}
