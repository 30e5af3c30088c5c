//! Applying computed patches to a deployed copy reproduces the new model code

use std::fs;
use tempfile::TempDir;
use truss_patch::diff::DiffOptions;
use truss_patch::patch::{
    apply_patches, calc_truss_patch, patches_from_json, patches_to_json, ModelCodePatch, Patch,
};
use truss_patch::signature::{calc_truss_signature, TrussSignature};
use truss_patch::tree::walker::WalkerConfig;

use crate::integration::test_utils::{copy_dir, create_truss, read_tree, write_files};

#[test]
fn test_patched_deployment_matches_truss() {
    let temp_dir = TempDir::new().unwrap();
    let truss_dir = create_truss(
        &temp_dir,
        "model",
        &[
            ("model/model.py", "class Model: pass\n"),
            ("model/old.py", "old\n"),
            ("model/legacy/helpers.py", "h\n"),
            ("data/readme.txt", "docs\n"),
        ],
    );
    let signature = calc_truss_signature(&truss_dir, &WalkerConfig::default()).unwrap();

    // "Deploy" the model code as it is now
    let deployed = temp_dir.path().join("deployed");
    copy_dir(&truss_dir.join("model"), &deployed);

    // Local edits after deployment
    fs::write(truss_dir.join("model/model.py"), "class Model:\n    v = 2\n").unwrap();
    fs::remove_file(truss_dir.join("model/old.py")).unwrap();
    fs::remove_dir_all(truss_dir.join("model/legacy")).unwrap();
    write_files(
        &truss_dir,
        &[("model/new/feature.py", "x = 1\n"), ("data/more.txt", "ignored\n")],
    );

    let patches = calc_truss_patch(&truss_dir, &signature, &DiffOptions::default()).unwrap();

    // Patches travel as JSON
    let wire = patches_to_json(&patches).unwrap();
    let received = patches_from_json(&wire).unwrap();
    assert_eq!(received, patches);

    let summary = apply_patches(&deployed, &received).unwrap();
    assert!(summary.missing.is_empty());
    assert_eq!(read_tree(&deployed), read_tree(&truss_dir.join("model")));

    // Emptied directories are pruned
    assert!(!deployed.join("legacy").exists());
}

#[test]
fn test_second_calculation_after_commit_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let truss_dir = create_truss(&temp_dir, "model", &[("model/model.py", "A")]);
    let signature = calc_truss_signature(&truss_dir, &WalkerConfig::default()).unwrap();

    fs::write(truss_dir.join("model/model.py"), "B").unwrap();
    assert_eq!(
        calc_truss_patch(&truss_dir, &signature, &DiffOptions::default())
            .unwrap()
            .len(),
        1
    );

    let committed = calc_truss_signature(&truss_dir, &WalkerConfig::default()).unwrap();
    assert!(calc_truss_patch(&truss_dir, &committed, &DiffOptions::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_signature_file_round_trip_drives_patch() {
    let temp_dir = TempDir::new().unwrap();
    let truss_dir = create_truss(&temp_dir, "model", &[("model/model.py", "A")]);
    let signature_file = temp_dir.path().join("sig").join("signature.json");
    calc_truss_signature(&truss_dir, &WalkerConfig::default())
        .unwrap()
        .save(&signature_file)
        .unwrap();

    fs::write(truss_dir.join("model/model.py"), "B").unwrap();
    let previous = TrussSignature::load(&signature_file).unwrap();
    let patches = calc_truss_patch(&truss_dir, &previous, &DiffOptions::default()).unwrap();
    assert_eq!(
        patches,
        vec![Patch::ModelCode(ModelCodePatch::update("model.py", "B"))]
    );
}

#[test]
fn test_invalid_patch_list_leaves_target_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let deployed = temp_dir.path().join("deployed");
    write_files(&deployed, &[("model.py", "A")]);

    let patches = vec![
        Patch::ModelCode(ModelCodePatch::update("model.py", "B")),
        Patch::ModelCode(ModelCodePatch::update("../escape.py", "x")),
    ];
    assert!(apply_patches(&deployed, &patches).is_err());
    assert_eq!(fs::read_to_string(deployed.join("model.py")).unwrap(), "A");
    assert!(!temp_dir.path().join("escape.py").exists());
}
