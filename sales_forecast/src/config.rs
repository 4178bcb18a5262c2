//! File locations shared by the training job and the prediction service

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Data directory, relative to the project root
pub const DATA_DIR: &str = "data/files";
/// Sales dataset file name
pub const DATA_FILE: &str = "data.parquet";
/// Trained model file name
pub const MODEL_FILE: &str = "model.json";

/// Resolved file paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paths {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub data_path: PathBuf,
    pub model_path: PathBuf,
}

impl Paths {
    /// Paths under an explicit project root
    pub fn from_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let data_dir = root.join(DATA_DIR);
        Self {
            data_path: data_dir.join(DATA_FILE),
            model_path: data_dir.join(MODEL_FILE),
            data_dir,
            root,
        }
    }

    /// Paths under the current working directory
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::from_root(cwd))
    }

    /// Replace the dataset location
    pub fn with_data_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.data_path = path;
        }
        self
    }

    /// Replace the model location
    pub fn with_model_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.model_path = path;
        }
        self
    }
}
