//! Truss directory trees
//!
//! Enumerates a truss directory and hashes its files. Every entry is
//! addressed by a root-relative key so trees and recorded signatures can be
//! compared set-wise.

pub mod hasher;
pub mod path;
pub mod walker;
