//! Filesystem walker for enumerating a truss directory

use crate::error::StorageError;
use crate::tree::path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Kind of a walked entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A walked filesystem entry
#[derive(Debug, Clone)]
pub struct Entry {
    /// Root-relative key (see [`crate::tree::path`])
    pub key: String,
    /// Path on disk
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Filesystem walker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false)
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Path components to skip entirely, e.g. `__pycache__` or `.git`
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Fail instead of walking more than this many entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

impl WalkerConfig {
    /// Whether any component of `key` matches an ignore pattern
    pub fn is_ignored(&self, key: &str) -> bool {
        if self.ignore_patterns.is_empty() {
            return false;
        }
        key.split('/')
            .any(|component| self.ignore_patterns.iter().any(|p| p == component))
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the tree and collect every file and directory below the root
    ///
    /// Returns entries sorted by key for determinism. The root itself is not
    /// included. Fails if two on-disk names normalize to the same key.
    pub fn walk(&self) -> Result<Vec<Entry>, StorageError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| !self.should_ignore(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                match e.into_io_error() {
                    Some(source) => StorageError::io(path, source),
                    None => StorageError::InvalidPath(format!(
                        "Filesystem loop detected at {:?}",
                        path
                    )),
                }
            })?;

            let file_type = entry.file_type();
            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                // Symlinks when not following them, sockets, fifos
                continue;
            };

            if let Some(limit) = self.config.max_entries {
                if entries.len() >= limit {
                    return Err(StorageError::TooManyEntries {
                        root: self.root.clone(),
                        limit,
                    });
                }
            }

            let key = path::relative_key(&self.root, entry.path())?;
            entries.push(Entry {
                key,
                path: entry.into_path(),
                kind,
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));

        if let Some(pair) = entries.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(StorageError::InvalidPath(format!(
                "{:?} and {:?} both map to key '{}'",
                pair[0].path, pair[1].path, pair[0].key
            )));
        }

        Ok(entries)
    }

    /// Check an entry against the ignore patterns, by relative components only
    fn should_ignore(&self, entry: &DirEntry) -> bool {
        if self.config.ignore_patterns.is_empty() {
            return false;
        }
        let Ok(relative) = entry.path().strip_prefix(&self.root) else {
            return false;
        };
        relative.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            self.config.ignore_patterns.iter().any(|p| *p == name)
        })
    }
}
