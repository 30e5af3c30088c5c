//! Patch builder: turn changed paths into model code patches

use crate::diff::{calc_changed_paths, DiffOptions};
use crate::error::{ApiError, StorageError};
use crate::patch::{sort_patches, ModelCodePatch, Patch};
use crate::signature::TrussSignature;
use crate::tree::{hasher, path};
use crate::truss_spec::TrussSpec;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Patches together with the tree state they describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchCalculation {
    pub patches: Vec<Patch>,
    /// Signature of the tree as the patches see it: model files hash the
    /// exact content carried by their UPDATE patch, all other files hash what
    /// the diff read. Recording it never skips an edit the patches missed.
    pub signature: TrussSignature,
}

/// Calculate the patches that bring a deployed truss up to date with `truss_dir`
///
/// The model code directory comes from the truss's own `config.yaml`. Only
/// changes under it produce patches; everything else is skipped.
pub fn calc_truss_patch(
    truss_dir: &Path,
    previous: &TrussSignature,
    options: &DiffOptions,
) -> Result<Vec<Patch>, ApiError> {
    Ok(calc_truss_patch_with_signature(truss_dir, previous, options)?.patches)
}

/// Like [`calc_truss_patch`], also returning the signature the patches describe
pub fn calc_truss_patch_with_signature(
    truss_dir: &Path,
    previous: &TrussSignature,
    options: &DiffOptions,
) -> Result<PatchCalculation, ApiError> {
    let spec = TrussSpec::load(truss_dir)?;
    debug!(model_dir = %spec.model_module_dir().display(), "Resolved model code directory");
    calc_model_dir_patch(truss_dir, spec.model_module_dir_key(), previous, options)
}

/// Calculate model code patches for an explicit model directory key
///
/// Fails as a whole if any in-scope file cannot be read; a partial patch list
/// is never returned.
pub fn calc_patch_for_model_dir(
    truss_dir: &Path,
    model_dir_key: &str,
    previous: &TrussSignature,
    options: &DiffOptions,
) -> Result<Vec<Patch>, ApiError> {
    Ok(calc_model_dir_patch(truss_dir, model_dir_key, previous, options)?.patches)
}

fn calc_model_dir_patch(
    truss_dir: &Path,
    model_dir_key: &str,
    previous: &TrussSignature,
    options: &DiffOptions,
) -> Result<PatchCalculation, ApiError> {
    let changed = calc_changed_paths(truss_dir, previous, options)?;
    let model_dir_key = path::normalize_key(model_dir_key);

    let mut patches = Vec::new();
    let mut shipped_hashes = BTreeMap::new();

    for key in &changed.removed {
        match path::strip_dir_prefix(key, &model_dir_key) {
            Some(relative) => {
                debug!(path = %key, "Removing model code file");
                patches.push(Patch::ModelCode(ModelCodePatch::remove(relative)));
            }
            None => debug!(path = %key, "Removed path outside model code, skipping"),
        }
    }

    for key in changed.added.iter().chain(changed.updated.iter()) {
        let Some(relative) = path::strip_dir_prefix(key, &model_dir_key) else {
            debug!(path = %key, "Changed path outside model code, skipping");
            continue;
        };

        // Directories are not patchable
        let Some(file) = changed.file_path(key) else {
            continue;
        };

        let content = read_text(file)?;
        debug!(path = %key, bytes = content.len(), "Updating model code file");
        shipped_hashes.insert(key.clone(), hasher::content_hash(content.as_bytes()));
        patches.push(Patch::ModelCode(ModelCodePatch::update(relative, content)));
    }

    sort_patches(&mut patches);

    let mut hashes = changed.observed_signature().content_hashes_by_path().clone();
    hashes.extend(shipped_hashes);

    info!(
        truss_dir = %truss_dir.display(),
        model_dir = %model_dir_key,
        changed_paths = changed.len(),
        patches = patches.len(),
        "Calculated truss patch"
    );

    Ok(PatchCalculation {
        patches,
        signature: TrussSignature::new(hashes),
    })
}

fn read_text(file: &Path) -> Result<String, StorageError> {
    fs::read_to_string(file).map_err(|e| {
        if e.kind() == ErrorKind::InvalidData {
            StorageError::NonUtf8Content(file.to_path_buf())
        } else {
            StorageError::io(file, e)
        }
    })
}
