//! Patches
//!
//! A patch is one file-level change that brings a deployed model's code in
//! line with the local truss without a full redeploy. Only model code patches
//! exist today; paths are relative to the model code directory.
//!
//! Patch lists are totally ordered: every removal comes before every update,
//! and patches of the same action are sorted by path. Applying a list in order
//! is therefore safe when a removed file is replaced by a directory of the
//! same name.

pub mod apply;
pub mod builder;

pub use apply::{apply_patches, ApplySummary};
pub use builder::{
    calc_patch_for_model_dir, calc_truss_patch, calc_truss_patch_with_signature, PatchCalculation,
};

use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// Patch category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchType {
    ModelCode,
}

/// File-level action of a model code patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    // Declaration order is the application order
    Remove,
    Update,
}

/// Change to one file under the model code directory
///
/// An `Update` always carries the full file content; a `Remove` never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ModelCodePatchRepr", into = "ModelCodePatchRepr")]
pub struct ModelCodePatch {
    action: Action,
    path: String,
    content: Option<String>,
}

impl ModelCodePatch {
    pub fn update(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            action: Action::Update,
            path: path.into(),
            content: Some(content.into()),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            action: Action::Remove,
            path: path.into(),
            content: None,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Path relative to the model code directory
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

#[derive(Serialize, Deserialize)]
struct ModelCodePatchRepr {
    action: Action,
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl TryFrom<ModelCodePatchRepr> for ModelCodePatch {
    type Error = ApiError;

    fn try_from(repr: ModelCodePatchRepr) -> Result<Self, Self::Error> {
        match (repr.action, repr.content) {
            (Action::Update, Some(content)) => Ok(ModelCodePatch::update(repr.path, content)),
            (Action::Update, None) => Err(ApiError::InvalidPatch(format!(
                "UPDATE patch for '{}' has no content",
                repr.path
            ))),
            (Action::Remove, None) => Ok(ModelCodePatch::remove(repr.path)),
            (Action::Remove, Some(_)) => Err(ApiError::InvalidPatch(format!(
                "REMOVE patch for '{}' carries content",
                repr.path
            ))),
        }
    }
}

impl From<ModelCodePatch> for ModelCodePatchRepr {
    fn from(patch: ModelCodePatch) -> Self {
        Self {
            action: patch.action,
            path: patch.path,
            content: patch.content,
        }
    }
}

/// A typed patch; serialized as `{"type": ..., "body": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Patch {
    ModelCode(ModelCodePatch),
}

impl Patch {
    pub fn patch_type(&self) -> PatchType {
        match self {
            Patch::ModelCode(_) => PatchType::ModelCode,
        }
    }

    fn order_key(&self) -> (PatchType, Action, &str) {
        match self {
            Patch::ModelCode(body) => (PatchType::ModelCode, body.action, body.path.as_str()),
        }
    }
}

/// Put patches in application order: removals first, then by path
pub fn sort_patches(patches: &mut [Patch]) {
    patches.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
}

/// Serialize a patch list as a JSON array
pub fn patches_to_json(patches: &[Patch]) -> Result<String, ApiError> {
    serde_json::to_string_pretty(patches)
        .map_err(|e| ApiError::InvalidPatch(format!("Failed to serialize patches: {}", e)))
}

/// Parse a JSON array of patches, enforcing the content invariant
pub fn patches_from_json(json: &str) -> Result<Vec<Patch>, ApiError> {
    serde_json::from_str(json)
        .map_err(|e| ApiError::InvalidPatch(format!("Failed to parse patches: {}", e)))
}
