//! Configuration System
//!
//! Layered configuration for patch calculation: walker and diff policy, the
//! signature store location, and logging. Sources merge in a fixed order, see
//! [`ConfigLoader::load`].

use crate::diff::DiffOptions;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::workspace_file::WORKSPACE_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchConfig {
    /// Walker and type-change policy used by diffs and signatures
    #[serde(default)]
    pub diff: DiffOptions,

    /// Signature store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Signature store location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory; defaults to the per-user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the store directory
    ///
    /// Relative paths are taken relative to `truss_dir`. Without an explicit
    /// path the platform data directory is used, falling back to
    /// `<truss_dir>/.truss-patch/signatures` when none is known.
    pub fn resolve_path(&self, truss_dir: &Path) -> PathBuf {
        match &self.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => truss_dir.join(path),
            None => directories::ProjectDirs::from("", "", "truss-patch")
                .map(|dirs| dirs.data_dir().join("signatures"))
                .unwrap_or_else(|| truss_dir.join(".truss-patch").join("signatures")),
        }
    }
}

impl PatchConfig {
    /// Validate the configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.logging.validate() {
            errors.push(format!("logging: {}", e));
        }
        if self.diff.walker.max_entries == Some(0) {
            errors.push("diff.walker: max_entries must be greater than zero".to_string());
        }
        for pattern in &self.diff.walker.ignore_patterns {
            if pattern.is_empty() || pattern.contains('/') {
                errors.push(format!(
                    "diff.walker: ignore pattern '{}' must be a single path component",
                    pattern
                ));
            }
        }
        if let Some(path) = &self.store.path {
            if path.as_os_str().is_empty() {
                errors.push("store: path cannot be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
