//! Command routing through the run context, as the binary drives it

use std::fs;
use tempfile::TempDir;
use truss_patch::cli::{Commands, OutputFormat, RunContext, SignatureSource, StoreCommands};
use truss_patch::config::{ConfigLoader, PatchConfig, StoreConfig, WORKSPACE_CONFIG_FILE};
use truss_patch::error::ApiError;
use truss_patch::patch::patches_from_json;

use crate::integration::test_utils::{create_truss, with_xdg_env};

fn context(temp_dir: &TempDir) -> RunContext {
    let truss_dir = create_truss(temp_dir, "model", &[("model/model.py", "A")]);
    let config = PatchConfig {
        store: StoreConfig {
            path: Some(temp_dir.path().join("store")),
        },
        ..Default::default()
    };
    RunContext::with_config(truss_dir, config).unwrap()
}

fn by_key(key: &str) -> SignatureSource {
    SignatureSource {
        signature: None,
        key: Some(key.to_string()),
    }
}

#[test]
fn test_signature_file_then_diff() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);
    let sig_file = temp_dir.path().join("sig.json");

    ctx.execute(&Commands::Signature {
        out: Some(sig_file.clone()),
    })
    .unwrap();
    fs::write(ctx.truss_dir().join("model/model.py"), "B").unwrap();

    let output = ctx
        .execute(&Commands::Diff {
            source: SignatureSource {
                signature: Some(sig_file),
                key: None,
            },
            format: OutputFormat::Json,
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["updated"][0], "model/model.py");
}

#[test]
fn test_store_list_and_remove() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);

    ctx.execute(&Commands::Record {
        key: "prod".to_string(),
    })
    .unwrap();
    ctx.execute(&Commands::Record {
        key: "staging".to_string(),
    })
    .unwrap();

    let listed = ctx
        .execute(&Commands::Store {
            command: StoreCommands::List {
                format: OutputFormat::Json,
            },
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&listed).unwrap();
    let keys: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["prod", "staging"]);

    ctx.execute(&Commands::Store {
        command: StoreCommands::Remove {
            key: "prod".to_string(),
        },
    })
    .unwrap();
    let again = ctx.execute(&Commands::Store {
        command: StoreCommands::Remove {
            key: "prod".to_string(),
        },
    });
    assert!(matches!(again, Err(ApiError::SignatureNotFound(_))));
}

#[test]
fn test_patch_then_apply_through_commands() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);
    ctx.execute(&Commands::Record {
        key: "prod".to_string(),
    })
    .unwrap();

    let deployed = temp_dir.path().join("deployed");
    fs::create_dir_all(&deployed).unwrap();
    fs::write(deployed.join("model.py"), "A").unwrap();

    fs::write(ctx.truss_dir().join("model/model.py"), "B").unwrap();
    let output = ctx
        .execute(&Commands::Patch {
            source: by_key("prod"),
            format: OutputFormat::Json,
            commit: false,
        })
        .unwrap();
    assert_eq!(patches_from_json(&output).unwrap().len(), 1);

    let patch_file = temp_dir.path().join("patches.json");
    fs::write(&patch_file, &output).unwrap();
    ctx.execute(&Commands::Apply {
        patches: patch_file,
        target: deployed.clone(),
    })
    .unwrap();
    assert_eq!(fs::read_to_string(deployed.join("model.py")).unwrap(), "B");
}

#[test]
fn test_run_context_reads_truss_local_config() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let truss_dir = create_truss(&temp_dir, "model", &[("model/model.py", "A")]);
        fs::write(
            truss_dir.join(WORKSPACE_CONFIG_FILE),
            format!(
                "[diff]\ntype_change = \"reject\"\n\n[store]\npath = \"{}\"\n",
                temp_dir.path().join("store").display()
            ),
        )
        .unwrap();

        let ctx = RunContext::new(truss_dir.clone(), None).unwrap();
        assert_eq!(
            ctx.config().diff.type_change,
            truss_patch::diff::TypeChangePolicy::Reject
        );
        assert_eq!(ctx.config(), &ConfigLoader::load(&truss_dir).unwrap());
    });
}
