//! Config loading facade: assembles sources in merge order and deserializes.

use crate::config::merge::merge_policy;
use crate::config::sources::{env, global_file, workspace_file};
use crate::config::PatchConfig;
use crate::error::{ApiError, StorageError};
use config::File;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads [`PatchConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the truss at `truss_dir`
    ///
    /// Precedence (lowest to highest): defaults, global file, truss-local
    /// `.truss-patch.toml`, `TRUSS_PATCH__*` environment variables.
    pub fn load(truss_dir: &Path) -> Result<PatchConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, truss_dir)?;
        let builder = env::add_to_builder(builder);

        let config: PatchConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, still honoring environment overrides
    pub fn load_from_file(path: &Path) -> Result<PatchConfig, ApiError> {
        if !path.is_file() {
            return Err(ApiError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = env::add_to_builder(builder);

        let config: PatchConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Path of the global configuration file, if a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Path of the truss-local configuration file
    pub fn workspace_config_path(truss_dir: &Path) -> PathBuf {
        workspace_file::workspace_config_path(truss_dir)
    }

    /// Write the default configuration as TOML
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ApiError> {
        if path.exists() && !force {
            return Err(ApiError::ConfigError(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        let rendered = toml::to_string_pretty(&PatchConfig::default())
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }
        fs::write(path, rendered).map_err(|e| StorageError::io(path, e))?;
        Ok(())
    }
}
