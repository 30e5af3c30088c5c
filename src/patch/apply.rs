//! Apply model code patches to a model code directory

use crate::error::{ApiError, StorageError};
use crate::patch::{sort_patches, Action, Patch};
use crate::tree::path;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of applying a patch list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    /// Removals whose target did not exist
    pub missing: Vec<String>,
}

/// Apply `patches` to `model_dir` in application order
///
/// Every path is validated, and every UPDATE target checked against the
/// directory as it will look after the list's removals, before anything is
/// written. An invalid list leaves the directory untouched. Application is
/// not transactional: an I/O failure partway through leaves the patches
/// before it applied.
pub fn apply_patches(model_dir: &Path, patches: &[Patch]) -> Result<ApplySummary, ApiError> {
    for patch in patches {
        let Patch::ModelCode(body) = patch;
        path::validate_patch_path(body.path())
            .map_err(|e| ApiError::InvalidPatch(e.to_string()))?;
    }

    let removals: HashSet<&str> = patches
        .iter()
        .filter_map(|patch| {
            let Patch::ModelCode(body) = patch;
            (body.action() == Action::Remove).then(|| body.path())
        })
        .collect();
    for patch in patches {
        let Patch::ModelCode(body) = patch;
        if body.action() == Action::Update {
            check_update_target(model_dir, body.path(), &removals)?;
        }
    }

    let mut ordered = patches.to_vec();
    sort_patches(&mut ordered);

    fs::create_dir_all(model_dir).map_err(|e| StorageError::io(model_dir, e))?;

    let mut summary = ApplySummary::default();
    for patch in &ordered {
        let Patch::ModelCode(body) = patch;
        let target = model_dir.join(body.path());
        match (body.action(), body.content()) {
            (Action::Update, Some(content)) => {
                write_atomic(&target, content)?;
                debug!(path = %body.path(), "Applied update");
                summary.updated.push(body.path().to_string());
            }
            (Action::Remove, _) => {
                if remove_path(&target)? {
                    prune_empty_parents(&target, model_dir);
                    debug!(path = %body.path(), "Applied removal");
                    summary.removed.push(body.path().to_string());
                } else {
                    warn!(path = %body.path(), "Path to remove does not exist");
                    summary.missing.push(body.path().to_string());
                }
            }
            (Action::Update, None) => {
                return Err(ApiError::InvalidPatch(format!(
                    "UPDATE patch for '{}' has no content",
                    body.path()
                )))
            }
        }
    }

    info!(
        model_dir = %model_dir.display(),
        updated = summary.updated.len(),
        removed = summary.removed.len(),
        missing = summary.missing.len(),
        "Applied patches"
    );

    Ok(summary)
}

/// An UPDATE needs directories above it and no directory in its place
///
/// A path cleared by one of the list's removals counts as free.
fn check_update_target(
    model_dir: &Path,
    patch_path: &str,
    removals: &HashSet<&str>,
) -> Result<(), ApiError> {
    let mut prefix = String::new();
    let mut parts = patch_path.split('/').peekable();
    while let Some(part) = parts.next() {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(part);
        if removals.contains(prefix.as_str()) {
            return Ok(());
        }

        let on_disk = model_dir.join(&prefix);
        let blocked = if parts.peek().is_none() {
            on_disk.is_dir()
        } else {
            on_disk.exists() && !on_disk.is_dir()
        };
        if blocked {
            return Err(ApiError::InvalidPatch(format!(
                "cannot update '{}': '{}' is in the way on the target",
                patch_path, prefix
            )));
        }
    }
    Ok(())
}

fn write_atomic(target: &Path, content: &str) -> Result<(), ApiError> {
    if target.is_dir() {
        return Err(ApiError::InvalidPatch(format!(
            "cannot update {:?}: it is a directory",
            target
        )));
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let temp_path = temp_path_for(target);
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| StorageError::io(&temp_path, e))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| StorageError::io(&temp_path, e))?;
    drop(file);

    fs::rename(&temp_path, target).map_err(|e| StorageError::io(target, e))?;
    Ok(())
}

fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.patch.tmp", name))
}

/// Remove a file or directory tree; false if nothing was there
fn remove_path(target: &Path) -> Result<bool, StorageError> {
    let metadata = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(StorageError::io(target, e)),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(target).map_err(|e| StorageError::io(target, e))?;
    } else {
        fs::remove_file(target).map_err(|e| StorageError::io(target, e))?;
    }
    Ok(true)
}

/// Remove directories left empty by a removal, stopping at `model_dir`
fn prune_empty_parents(target: &Path, model_dir: &Path) {
    let mut current = target.parent();
    while let Some(dir) = current {
        if dir == model_dir || !dir.starts_with(model_dir) {
            break;
        }
        // Only succeeds if empty
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}
