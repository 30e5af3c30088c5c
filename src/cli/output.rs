//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, StorageError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::StorageError(StorageError::TooManyEntries { limit, .. }) => format!(
            "{}\nRaise diff.walker.max_entries (currently {}) or add ignore patterns.",
            e, limit
        ),
        ApiError::TypeChanged(_) => format!(
            "{}\nSet diff.type_change to \"ignore\" or \"remove\" to allow this change.",
            e
        ),
        _ => e.to_string(),
    }
}
