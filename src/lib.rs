//! Truss Patch: live-patching deployed model code
//!
//! Records content signatures of truss directories, diffs a truss against a
//! recorded signature, and turns the changes under the model code directory
//! into an ordered list of patches that can be shipped to, and applied on, a
//! running model without a full redeploy.

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod logging;
pub mod patch;
pub mod signature;
pub mod store;
pub mod tree;
pub mod truss_spec;
