//! Truss-local config file source: <truss>/.truss-patch.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

/// File name of the per-truss config file
pub const WORKSPACE_CONFIG_FILE: &str = ".truss-patch.toml";

pub fn workspace_config_path(truss_dir: &Path) -> PathBuf {
    truss_dir.join(WORKSPACE_CONFIG_FILE)
}

/// Add the truss-local config file to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    truss_dir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = workspace_config_path(truss_dir);
    if path.is_file() {
        return Ok(builder.add_source(File::from(path).required(false)));
    }
    Ok(builder)
}
