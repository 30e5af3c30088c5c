//! Path differ: classify a truss tree against a recorded signature

use crate::error::ApiError;
use crate::signature::TrussSignature;
use crate::tree::hasher::{self, ContentHash};
use crate::tree::walker::{Entry, Walker, WalkerConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to do with a signature path that is no longer a regular file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeChangePolicy {
    /// Treat it as unchanged
    #[default]
    Ignore,
    /// Report it as removed; anything now below it is already reported as added
    Remove,
    /// Fail the calculation
    Reject,
}

/// Options for a diff run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffOptions {
    #[serde(default)]
    pub walker: WalkerConfig,
    #[serde(default)]
    pub type_change: TypeChangePolicy,
}

/// Paths classified against a signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangedPaths {
    pub added: BTreeSet<String>,
    pub updated: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    /// On-disk location of every regular file seen by the walk, by key
    #[serde(skip)]
    files: BTreeMap<String, PathBuf>,
    /// Content hash of every regular file seen by the walk
    #[serde(skip)]
    observed: BTreeMap<String, ContentHash>,
}

impl ChangedPaths {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }

    /// Where the regular file behind `key` lives on disk
    ///
    /// Keys are NFC-normalized, so the on-disk name may differ from the key.
    /// `None` for directories and for paths that no longer exist.
    pub fn file_path(&self, key: &str) -> Option<&Path> {
        self.files.get(key).map(PathBuf::as_path)
    }

    /// The tree state this diff observed, as a signature
    pub fn observed_signature(&self) -> TrussSignature {
        TrussSignature::new(self.observed.clone())
    }
}

/// Compute added, updated and removed paths of `root` relative to `previous`
///
/// Directories are never compared by content. A directory is only reported as
/// added when no file recorded in `previous` lives below it.
pub fn calc_changed_paths(
    root: &Path,
    previous: &TrussSignature,
    options: &DiffOptions,
) -> Result<ChangedPaths, ApiError> {
    let entries = Walker::with_config(root.to_path_buf(), options.walker.clone()).walk()?;
    let current: BTreeMap<&str, &Entry> = entries.iter().map(|e| (e.key.as_str(), e)).collect();

    let previous_paths: BTreeSet<&str> = previous
        .paths()
        .filter(|key| !options.walker.is_ignored(key))
        .collect();

    // Directories holding a recorded file count as recorded themselves
    let recorded_dirs: BTreeSet<&str> = previous_paths
        .iter()
        .flat_map(|key| key.match_indices('/').map(move |(i, _)| &key[..i]))
        .collect();

    let mut changed = ChangedPaths::default();

    for (key, entry) in &current {
        let known = previous_paths.contains(key)
            || (!entry.is_file() && recorded_dirs.contains(key));
        if entry.is_file() {
            changed.files.insert((*key).to_string(), entry.path.clone());
        }
        if !known {
            changed.added.insert((*key).to_string());
            if entry.is_file() {
                let content_hash = hasher::file_content_hash(&entry.path)?;
                changed.observed.insert((*key).to_string(), content_hash);
            }
        }
    }

    for key in &previous_paths {
        match current.get(key) {
            None => {
                changed.removed.insert((*key).to_string());
            }
            Some(entry) if entry.is_file() => {
                let content_hash = hasher::file_content_hash(&entry.path)?;
                if previous.get(key) != Some(&content_hash) {
                    changed.updated.insert((*key).to_string());
                }
                changed.observed.insert((*key).to_string(), content_hash);
            }
            Some(_) => match options.type_change {
                TypeChangePolicy::Ignore => {
                    debug!(path = %key, "Signature path is no longer a file, ignoring");
                }
                TypeChangePolicy::Remove => {
                    debug!(path = %key, "Signature path is no longer a file, removing");
                    changed.removed.insert((*key).to_string());
                }
                TypeChangePolicy::Reject => {
                    return Err(ApiError::TypeChanged((*key).to_string()));
                }
            },
        }
    }

    debug!(
        root = %root.display(),
        added = changed.added.len(),
        updated = changed.updated.len(),
        removed = changed.removed.len(),
        "Calculated changed paths"
    );

    Ok(changed)
}
