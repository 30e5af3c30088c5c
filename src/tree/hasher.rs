//! Content hashing for truss files using BLAKE3

use crate::error::StorageError;
use blake3::Hasher;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Hex-encoded BLAKE3 digest of a file's bytes.
pub type ContentHash = String;

/// Compute the content hash of a file
///
/// The file is streamed through the hasher, so arbitrarily large files are
/// never held in memory. Byte-identical content always yields the same hash.
pub fn file_content_hash(path: &Path) -> Result<ContentHash, StorageError> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = Hasher::new();
    io::copy(&mut reader, &mut hasher).map_err(|e| StorageError::io(path, e))?;
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

/// Compute the content hash of in-memory bytes
///
/// Agrees with [`file_content_hash`] for identical bytes.
pub fn content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hex::encode(hasher.finalize().as_bytes())
}
