//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, ConfigCommands, OutputFormat, SignatureSource, StoreCommands};
use crate::cli::presentation;
use crate::config::{ConfigLoader, PatchConfig};
use crate::diff::calc_changed_paths;
use crate::error::{ApiError, StorageError};
use crate::patch::{
    apply_patches, calc_truss_patch_with_signature, patches_from_json, patches_to_json,
};
use crate::signature::{calc_truss_signature, TrussSignature};
use crate::store::{SignatureRecord, SignatureStore, SledSignatureStore};
use crate::tree::path;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Runtime context for CLI execution: truss root, effective configuration, and the
/// signature store (opened on first use).
pub struct RunContext {
    truss_dir: PathBuf,
    config: PatchConfig,
    store: OnceLock<SledSignatureStore>,
}

impl RunContext {
    /// Create run context from the truss root and optional config path.
    pub fn new(truss_dir: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let truss_dir = path::canonical_root(&truss_dir)?;
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&truss_dir)?,
        };
        Self::with_config(truss_dir, config)
    }

    /// Create run context with an already loaded configuration.
    pub fn with_config(truss_dir: PathBuf, config: PatchConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            ))
        })?;
        Ok(Self {
            truss_dir,
            config,
            store: OnceLock::new(),
        })
    }

    pub fn truss_dir(&self) -> &Path {
        &self.truss_dir
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    fn open_store(&self) -> Result<&SledSignatureStore, ApiError> {
        if let Some(store) = self.store.get() {
            return Ok(store);
        }
        let store_path = self.config.store.resolve_path(&self.truss_dir);
        fs::create_dir_all(&store_path).map_err(|e| StorageError::io(&store_path, e))?;
        let store = SledSignatureStore::new(&store_path)?;
        Ok(self.store.get_or_init(|| store))
    }

    fn load_previous(&self, source: &SignatureSource) -> Result<TrussSignature, ApiError> {
        match (&source.signature, &source.key) {
            (Some(file), _) => TrussSignature::load(file),
            (None, Some(key)) => Ok(self.open_store()?.require(key)?.signature),
            (None, None) => Err(ApiError::InvalidSignature(
                "either --signature or --key is required".to_string(),
            )),
        }
    }

    fn current_signature(&self) -> Result<TrussSignature, ApiError> {
        calc_truss_signature(&self.truss_dir, &self.config.diff.walker)
    }

    /// Execute a command and return its output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Signature { out } => {
                let signature = self.current_signature()?;
                match out {
                    Some(file) => {
                        signature.save(file)?;
                        Ok(format!(
                            "Wrote signature of {} files to {}",
                            signature.len(),
                            file.display()
                        ))
                    }
                    None => signature.to_json(),
                }
            }
            Commands::Record { key } => {
                let signature = self.current_signature()?;
                let count = signature.len();
                self.open_store()?.put(key, &SignatureRecord::now(signature))?;
                info!(key = %key, files = count, "Recorded signature");
                Ok(format!("Recorded signature of {} files under '{}'", count, key))
            }
            Commands::Diff { source, format } => {
                let previous = self.load_previous(source)?;
                let changed = calc_changed_paths(&self.truss_dir, &previous, &self.config.diff)?;
                match format {
                    OutputFormat::Json => presentation::format_changed_paths_json(&changed),
                    OutputFormat::Text => Ok(presentation::format_changed_paths_text(&changed)),
                }
            }
            Commands::Patch {
                source,
                format,
                commit,
            } => {
                let previous = self.load_previous(source)?;
                let calculation =
                    calc_truss_patch_with_signature(&self.truss_dir, &previous, &self.config.diff)?;
                let patches = calculation.patches;

                if *commit {
                    if let Some(key) = &source.key {
                        // The state the patches describe, not a fresh walk
                        let files = calculation.signature.len();
                        self.open_store()?
                            .put(key, &SignatureRecord::now(calculation.signature))?;
                        info!(key = %key, files, "Committed signature described by the patches");
                    }
                }

                match format {
                    OutputFormat::Json => patches_to_json(&patches),
                    OutputFormat::Text => Ok(presentation::format_patches_text(&patches)),
                }
            }
            Commands::Apply { patches, target } => {
                let raw = fs::read_to_string(patches).map_err(|e| StorageError::io(patches, e))?;
                let patches = patches_from_json(&raw)?;
                let summary = apply_patches(target, &patches)?;
                Ok(presentation::format_apply_summary(&summary))
            }
            Commands::Store { command } => self.execute_store(command),
            Commands::Config { command } => self.execute_config(command),
        }
    }

    fn execute_store(&self, command: &StoreCommands) -> Result<String, ApiError> {
        let store = self.open_store()?;
        match command {
            StoreCommands::List { format } => {
                let mut records = Vec::new();
                for key in store.list()? {
                    if let Some(record) = store.get(&key)? {
                        records.push((key, record));
                    }
                }
                match format {
                    OutputFormat::Json => presentation::format_store_list_json(&records),
                    OutputFormat::Text => Ok(presentation::format_store_list_text(&records)),
                }
            }
            StoreCommands::Remove { key } => {
                if store.remove(key)? {
                    Ok(format!("Removed signature '{}'", key))
                } else {
                    Err(ApiError::SignatureNotFound(key.clone()))
                }
            }
        }
    }

    fn execute_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Init { force } => {
                let path = ConfigLoader::workspace_config_path(&self.truss_dir);
                ConfigLoader::write_default(&path, *force)?;
                Ok(format!("Wrote default configuration to {}", path.display()))
            }
            ConfigCommands::Show => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }
}
