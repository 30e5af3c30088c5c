//! Relative path keys and path validation
//!
//! Signatures and diffs address entries by a root-relative key: `/`-separated,
//! no leading `./`, no trailing slash, Unicode NFC. The same tree therefore
//! produces the same keys regardless of the host that walked it.

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a truss root directory
pub fn canonical_root(path: &Path) -> Result<PathBuf, StorageError> {
    dunce::canonicalize(path).map_err(|e| StorageError::io(path, e))
}

/// Build the key for `path` relative to `root`
pub fn relative_key(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::InvalidPath(format!("{:?} is not under {:?}", path, root))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    StorageError::InvalidPath(format!("Non UTF-8 path name: {:?}", path))
                })?;
                parts.push(name);
            }
            Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "Unexpected component in {:?}",
                    relative
                )))
            }
        }
    }

    Ok(normalize_key(&parts.join("/")))
}

/// Normalize a key read from an external source such as a signature file
pub fn normalize_key(key: &str) -> String {
    let normalized: String = key.replace('\\', "/").nfc().collect();
    normalized
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Return `key` relative to the directory `dir_key`, if it lies strictly under it
///
/// The test is per component: `model_extra/a.py` is not under `model`. An
/// empty `dir_key` is the root, which contains every key.
pub fn strip_dir_prefix<'a>(key: &'a str, dir_key: &str) -> Option<&'a str> {
    if dir_key.is_empty() {
        return if key.is_empty() { None } else { Some(key) };
    }
    let rest = key.strip_prefix(dir_key)?;
    let rest = rest.strip_prefix('/')?;
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Check that a patch path stays inside the directory it is applied to
pub fn validate_patch_path(path: &str) -> Result<(), StorageError> {
    if path.trim().is_empty() {
        return Err(StorageError::InvalidPath("empty patch path".to_string()));
    }
    let as_path = Path::new(path);
    if as_path.is_absolute() || path.starts_with('/') || path.starts_with('\\') {
        return Err(StorageError::InvalidPath(format!(
            "patch path must be relative: {}",
            path
        )));
    }
    for component in as_path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "patch path escapes its directory: {}",
                    path
                )))
            }
        }
    }
    Ok(())
}
