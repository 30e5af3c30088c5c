//! Truss signatures
//!
//! A signature records the content hash of every file in a truss directory at
//! the moment a model version was deployed. Later patch calculations diff the
//! live directory against it.

use crate::error::{ApiError, StorageError};
use crate::tree::hasher::{self, ContentHash};
use crate::tree::path;
use crate::tree::walker::{Walker, WalkerConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Checkpoint of a truss directory's content: relative path -> content hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrussSignature {
    content_hashes_by_path: BTreeMap<String, ContentHash>,
}

impl TrussSignature {
    /// Build a signature, normalizing every key
    pub fn new(content_hashes_by_path: BTreeMap<String, ContentHash>) -> Self {
        let content_hashes_by_path = content_hashes_by_path
            .into_iter()
            .map(|(key, hash)| (path::normalize_key(&key), hash))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self {
            content_hashes_by_path,
        }
    }

    pub fn content_hashes_by_path(&self) -> &BTreeMap<String, ContentHash> {
        &self.content_hashes_by_path
    }

    pub fn get(&self, key: &str) -> Option<&ContentHash> {
        self.content_hashes_by_path.get(key)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.content_hashes_by_path.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.content_hashes_by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content_hashes_by_path.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ApiError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ApiError::InvalidSignature(format!("Failed to serialize: {}", e)))
    }

    /// Parse a signature from JSON; keys are normalized on the way in
    pub fn from_json(json: &str) -> Result<Self, ApiError> {
        let raw: TrussSignature = serde_json::from_str(json)
            .map_err(|e| ApiError::InvalidSignature(format!("Failed to parse: {}", e)))?;
        Ok(Self::new(raw.content_hashes_by_path))
    }

    /// Write the signature as JSON, via a temp file renamed into place
    pub fn save(&self, file: &Path) -> Result<(), ApiError> {
        let json = self.to_json()?;
        let temp_path = file.with_extension("tmp");

        if let Some(parent) = temp_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }

        let handle = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| StorageError::io(&temp_path, e))?;
        let mut writer = BufWriter::new(handle);
        writer
            .write_all(json.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| StorageError::io(&temp_path, e))?;
        drop(writer);

        fs::rename(&temp_path, file).map_err(|e| StorageError::io(file, e))?;
        Ok(())
    }

    pub fn load(file: &Path) -> Result<Self, ApiError> {
        let json = fs::read_to_string(file).map_err(|e| StorageError::io(file, e))?;
        Self::from_json(&json)
    }
}

/// Compute the signature of a truss directory
///
/// Every regular file is hashed; directories are never recorded.
pub fn calc_truss_signature(
    truss_dir: &Path,
    walker_config: &WalkerConfig,
) -> Result<TrussSignature, ApiError> {
    let entries = Walker::with_config(truss_dir.to_path_buf(), walker_config.clone()).walk()?;

    let mut content_hashes_by_path = BTreeMap::new();
    for entry in entries.into_iter().filter(|e| e.is_file()) {
        let hash = hasher::file_content_hash(&entry.path)?;
        content_hashes_by_path.insert(entry.key, hash);
    }

    debug!(
        truss_dir = %truss_dir.display(),
        files = content_hashes_by_path.len(),
        "Computed truss signature"
    );

    Ok(TrussSignature {
        content_hashes_by_path,
    })
}
