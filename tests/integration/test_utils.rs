//! Shared test utilities for integration tests
//!
//! Builds small truss directories on disk and isolates the XDG config
//! directory so user configuration never leaks into a test.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with `XDG_CONFIG_HOME` pointing into `test_dir`, restoring it afterwards
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::var("XDG_CONFIG_HOME").ok();

    let config_home = test_dir.path().join("config_home");
    fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = f();

    match original {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}

/// Write `files` (key, content) below `root`, creating parents
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (key, content) in files {
        let path = root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

/// Create a truss at `<temp>/truss` with a config.yaml and the given files
pub fn create_truss(temp_dir: &TempDir, model_module_dir: &str, files: &[(&str, &str)]) -> PathBuf {
    let truss_dir = temp_dir.path().join("truss");
    fs::create_dir_all(truss_dir.join(model_module_dir)).unwrap();
    fs::write(
        truss_dir.join("config.yaml"),
        format!("model_name: test\nmodel_module_dir: {}\n", model_module_dir),
    )
    .unwrap();
    write_files(&truss_dir, files);
    truss_dir
}

/// Copy a directory tree; used to stage the "deployed" side of a patch
pub fn copy_dir(from: &Path, to: &Path) {
    for entry in walkdir::WalkDir::new(from).min_depth(1) {
        let entry = entry.unwrap();
        let relative = entry.path().strip_prefix(from).unwrap();
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Collect every regular file below `root` as (relative key, content)
pub fn read_tree(root: &Path) -> Vec<(String, String)> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let key = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            files.push((key, fs::read_to_string(entry.path()).unwrap()));
        }
    }
    files
}
