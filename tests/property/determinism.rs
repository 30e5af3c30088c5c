//! Property-based tests for determinism and classification guarantees

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;
use truss_patch::diff::{calc_changed_paths, DiffOptions};
use truss_patch::patch::{calc_patch_for_model_dir, Action, Patch};
use truss_patch::signature::calc_truss_signature;
use truss_patch::tree::hasher;
use truss_patch::tree::walker::WalkerConfig;

/// Small trees: file name under either the model dir or a sibling, with text content
fn tree_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        ("(model|data)", "[a-e]{1,3}\\.py").prop_map(|(dir, name)| format!("{}/{}", dir, name)),
        "[a-z ]{0,16}",
        0..8,
    )
}

fn write_tree(root: &std::path::Path, files: &BTreeMap<String, String>) {
    for (key, content) in files {
        let path = root.join(key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// Test that content hashing is deterministic
#[test]
fn test_content_hash_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<Vec<u8>>(), any::<Vec<u8>>()), |(content1, content2)| {
            let hash1 = hasher::content_hash(&content1);
            let hash2 = hasher::content_hash(&content2);

            if content1 == content2 {
                assert_eq!(hash1, hash2);
            } else {
                // Collisions are theoretically possible, never expected
                prop_assume!(hash1 != hash2);
            }

            Ok(())
        })
        .unwrap();
}

/// An unchanged tree never reports changes or patches
#[test]
fn test_unchanged_tree_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32));

    runner
        .run(&tree_strategy(), |files| {
            let temp_dir = TempDir::new().unwrap();
            write_tree(temp_dir.path(), &files);

            let signature = calc_truss_signature(temp_dir.path(), &WalkerConfig::default()).unwrap();
            let changed =
                calc_changed_paths(temp_dir.path(), &signature, &DiffOptions::default()).unwrap();
            prop_assert!(changed.is_empty());

            let patches = calc_patch_for_model_dir(
                temp_dir.path(),
                "model",
                &signature,
                &DiffOptions::default(),
            )
            .unwrap();
            prop_assert!(patches.is_empty());
            Ok(())
        })
        .unwrap();
}

/// Every patch targets a model file, edits are updates, deletions are removals
#[test]
fn test_patch_classification_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32));

    runner
        .run(&(tree_strategy(), tree_strategy()), |(before, after)| {
            let temp_dir = TempDir::new().unwrap();
            write_tree(temp_dir.path(), &before);
            let signature = calc_truss_signature(temp_dir.path(), &WalkerConfig::default()).unwrap();

            for key in before.keys() {
                fs::remove_file(temp_dir.path().join(key)).unwrap();
            }
            write_tree(temp_dir.path(), &after);

            let patches = calc_patch_for_model_dir(
                temp_dir.path(),
                "model",
                &signature,
                &DiffOptions::default(),
            )
            .unwrap();

            let mut expected = Vec::new();
            for key in before.keys().filter(|k| !after.contains_key(*k)) {
                if let Some(rel) = key.strip_prefix("model/") {
                    expected.push((Action::Remove, rel.to_string(), None));
                }
            }
            for (key, content) in &after {
                let changed = before.get(key) != Some(content);
                if let (true, Some(rel)) = (changed, key.strip_prefix("model/")) {
                    expected.push((Action::Update, rel.to_string(), Some(content.clone())));
                }
            }

            let actual: Vec<(Action, String, Option<String>)> = patches
                .iter()
                .map(|p| {
                    let Patch::ModelCode(body) = p;
                    (
                        body.action(),
                        body.path().to_string(),
                        body.content().map(str::to_string),
                    )
                })
                .collect();
            prop_assert_eq!(actual, expected);
            Ok(())
        })
        .unwrap();
}

/// Repeated calculations over the same tree agree exactly
#[test]
fn test_patch_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(16));

    runner
        .run(&(tree_strategy(), tree_strategy()), |(before, after)| {
            let temp_dir = TempDir::new().unwrap();
            write_tree(temp_dir.path(), &before);
            let signature = calc_truss_signature(temp_dir.path(), &WalkerConfig::default()).unwrap();
            write_tree(temp_dir.path(), &after);

            let first =
                calc_patch_for_model_dir(temp_dir.path(), "model", &signature, &DiffOptions::default())
                    .unwrap();
            let second =
                calc_patch_for_model_dir(temp_dir.path(), "model", &signature, &DiffOptions::default())
                    .unwrap();
            prop_assert_eq!(first, second);
            Ok(())
        })
        .unwrap();
}
