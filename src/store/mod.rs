//! Signature Store
//!
//! Keeps the last recorded signature per deployment key. A record is never
//! edited in place: recording again under the same key supersedes it.

pub mod persistence;

pub use persistence::SledSignatureStore;

use crate::error::{ApiError, StorageError};
use crate::signature::TrussSignature;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored signature and when it was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub signature: TrussSignature,
    /// Milliseconds since the Unix epoch, UTC
    pub recorded_at_ms: i64,
}

impl SignatureRecord {
    /// Stamp a signature with the current time
    pub fn now(signature: TrussSignature) -> Self {
        Self {
            signature,
            recorded_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn recorded_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.recorded_at_ms)
    }
}

/// Signature Store interface
pub trait SignatureStore {
    fn get(&self, key: &str) -> Result<Option<SignatureRecord>, StorageError>;
    fn put(&self, key: &str, record: &SignatureRecord) -> Result<(), StorageError>;
    /// Remove a record; returns whether one existed
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
    /// All keys, sorted
    fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Fetch a record, treating absence as an error
    fn require(&self, key: &str) -> Result<SignatureRecord, ApiError> {
        self.get(key)?
            .ok_or_else(|| ApiError::SignatureNotFound(key.to_string()))
    }
}

/// Check that a deployment key is usable
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidPath(
            "signature key cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemorySignatureStore {
    records: RwLock<HashMap<String, SignatureRecord>>,
}

impl MemorySignatureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignatureStore for MemorySignatureStore {
    fn get(&self, key: &str) -> Result<Option<SignatureRecord>, StorageError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &str, record: &SignatureRecord) -> Result<(), StorageError> {
        validate_key(key)?;
        self.records.write().insert(key.to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.records.write().remove(key).is_some())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.records.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
