//! Property-based tests for diff and patch guarantees

mod determinism;
