//! Persistence layer for the Signature Store

use crate::error::StorageError;
use crate::store::{validate_key, SignatureRecord, SignatureStore};
use std::path::Path;

/// Keys of signature records; keeps room for other trees in the same db
const SIGNATURE_PREFIX: &str = "signature:";

fn db_error(context: &str, e: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{}: {}", context, e),
    ))
}

fn record_key(key: &str) -> String {
    format!("{}{}", SIGNATURE_PREFIX, key)
}

/// Sled-based implementation of SignatureStore
pub struct SledSignatureStore {
    db: sled::Db,
}

impl SledSignatureStore {
    /// Open (or create) a store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| db_error("Failed to open sled database", e))?;
        Ok(Self { db })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| db_error("Failed to flush database", e))?;
        Ok(())
    }
}

impl SignatureStore for SledSignatureStore {
    fn get(&self, key: &str) -> Result<Option<SignatureRecord>, StorageError> {
        match self
            .db
            .get(record_key(key).as_bytes())
            .map_err(|e| db_error("Failed to get signature record", e))?
        {
            Some(value) => {
                let record: SignatureRecord = bincode::deserialize(&value).map_err(|e| {
                    StorageError::Serialization(format!(
                        "Failed to deserialize signature record '{}': {}",
                        key, e
                    ))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, record: &SignatureRecord) -> Result<(), StorageError> {
        validate_key(key)?;
        let value = bincode::serialize(record).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize signature record: {}", e))
        })?;

        self.db
            .insert(record_key(key).as_bytes(), value)
            .map_err(|e| db_error("Failed to put signature record", e))?;
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let previous = self
            .db
            .remove(record_key(key).as_bytes())
            .map_err(|e| db_error("Failed to remove signature record", e))?;
        self.flush()?;
        Ok(previous.is_some())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for item in self.db.scan_prefix(SIGNATURE_PREFIX.as_bytes()) {
            let (key, _) = item.map_err(|e| db_error("Failed to iterate store", e))?;
            let key = String::from_utf8_lossy(&key[SIGNATURE_PREFIX.len()..]).into_owned();
            keys.push(key);
        }
        // sled iterates in byte order, which is already sorted
        Ok(keys)
    }
}
