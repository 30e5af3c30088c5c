//! Error types for truss patch calculation.

use std::path::PathBuf;
use thiserror::Error;

/// Filesystem and persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Directory tree under {root:?} exceeds the limit of {limit} entries")]
    TooManyEntries { root: PathBuf, limit: usize },

    #[error("File is not valid UTF-8 text: {0:?}")]
    NonUtf8Content(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Top-level errors surfaced to library callers and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid truss config: {0}")]
    InvalidTrussConfig(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Path changed type since the signature was recorded: {0}")]
    TypeChanged(String),

    #[error("No signature recorded under key '{0}'. Run `truss-patch record --key {0}` first.")]
    SignatureNotFound(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
