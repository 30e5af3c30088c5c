//! Truss layout as declared by a truss's `config.yaml`

use crate::error::{ApiError, StorageError};
use crate::tree::path;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the truss config file at the truss root
pub const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_MODEL_MODULE_DIR: &str = "model";

/// The subset of `config.yaml` that patch calculation depends on
#[derive(Debug, Clone, Deserialize)]
struct TrussConfig {
    #[serde(default = "default_model_module_dir")]
    model_module_dir: String,
}

fn default_model_module_dir() -> String {
    DEFAULT_MODEL_MODULE_DIR.to_string()
}

impl Default for TrussConfig {
    fn default() -> Self {
        Self {
            model_module_dir: default_model_module_dir(),
        }
    }
}

/// Resolved layout of a truss directory
#[derive(Debug, Clone)]
pub struct TrussSpec {
    truss_dir: PathBuf,
    model_module_dir_key: String,
}

impl TrussSpec {
    /// Load the spec of the truss at `truss_dir`
    ///
    /// A missing `config.yaml` means all defaults.
    pub fn load(truss_dir: &Path) -> Result<Self, ApiError> {
        let config_path = truss_dir.join(CONFIG_FILE_NAME);
        let config = if config_path.is_file() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|e| StorageError::io(&config_path, e))?;
            parse_config(&raw)?
        } else {
            TrussConfig::default()
        };

        Self::from_model_module_dir(truss_dir, &config.model_module_dir)
    }

    /// Build a spec with an explicit model module directory, relative to the truss root
    pub fn from_model_module_dir(truss_dir: &Path, model_module_dir: &str) -> Result<Self, ApiError> {
        path::validate_patch_path(model_module_dir).map_err(|e| {
            ApiError::InvalidTrussConfig(format!("model_module_dir '{}': {}", model_module_dir, e))
        })?;
        let model_module_dir_key = path::normalize_key(model_module_dir);
        if model_module_dir_key.is_empty() {
            return Err(ApiError::InvalidTrussConfig(
                "model_module_dir must name a subdirectory".to_string(),
            ));
        }

        Ok(Self {
            truss_dir: truss_dir.to_path_buf(),
            model_module_dir_key,
        })
    }

    /// Path of the model code directory under the truss root
    pub fn model_module_dir(&self) -> PathBuf {
        self.truss_dir.join(&self.model_module_dir_key)
    }

    /// Model code directory as a root-relative key
    pub fn model_module_dir_key(&self) -> &str {
        &self.model_module_dir_key
    }
}

fn parse_config(raw: &str) -> Result<TrussConfig, ApiError> {
    if raw.trim().is_empty() {
        return Ok(TrussConfig::default());
    }
    // An empty document parses as null, so go through Option
    let config: Option<TrussConfig> = serde_yaml::from_str(raw)
        .map_err(|e| ApiError::InvalidTrussConfig(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e)))?;
    Ok(config.unwrap_or_default())
}
