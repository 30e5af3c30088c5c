//! Hasher Implementation Verification Tests
//!
//! Tests to verify that content hashes are BLAKE3 digests and that file and
//! in-memory hashing agree.

use std::fs;
use tempfile::TempDir;
use truss_patch::tree::hasher;

/// Test that content hash matches BLAKE3 directly
#[test]
fn test_content_hash_matches_blake3() {
    let content = b"test content";

    let our_hash = hasher::content_hash(content);
    let blake3_hash = blake3::hash(content).to_hex().to_string();

    assert_eq!(our_hash, blake3_hash);
}

/// Test that streaming a file gives the same hash as hashing its bytes
#[test]
fn test_file_hash_matches_content_hash() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("model.py");

    // Larger than the read buffer so the file is hashed in several chunks
    let content = "def predict(x):\n    return x\n".repeat(4096);
    fs::write(&test_file, &content).unwrap();

    let from_file = hasher::file_content_hash(&test_file).unwrap();
    assert_eq!(from_file, hasher::content_hash(content.as_bytes()));
}

/// Test that the hash is a lowercase 64 character hex string
#[test]
fn test_hash_encoding() {
    let hash = hasher::content_hash(b"");
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

/// Test that a single changed byte changes the hash
#[test]
fn test_content_sensitivity() {
    assert_ne!(hasher::content_hash(b"A"), hasher::content_hash(b"B"));
    assert_ne!(hasher::content_hash(b"A"), hasher::content_hash(b"A\n"));
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(hasher::file_content_hash(&temp_dir.path().join("missing.py")).is_err());
}
