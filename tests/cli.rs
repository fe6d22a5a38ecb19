mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::{config_toml, write_repository};

fn catalog_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("catalog");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let repo_dir = root.join("repo");
    fs::create_dir_all(&repo_dir).unwrap();
    write_repository(&repo_dir);

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("catalog.toml");
    fs::write(&config_path, config_toml(&repo_dir.display().to_string())).unwrap();

    (tmp, config_path)
}

fn run_catalog(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = catalog_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run catalog binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_catalogs_lists_configuration() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_catalog(&config, &["catalogs"]);
    assert!(success);
    assert!(stdout.contains("datascience"));
    assert!(stdout.contains("universe"));
    assert!(stdout.contains("helm"));
}

#[test]
fn test_load_reports_skipped_versions() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_catalog(&config, &["load"]);
    assert!(success, "load failed: {}", stderr);
    assert!(stdout.contains("datascience: 1 charts, 2 versions, 1 failed"));
    assert!(stdout.contains("keepeme1.gz"));
    assert!(stdout.contains("universe: 1 charts, 0 versions, 0 failed"));
    assert!(stderr.contains("keepeme1.gz"), "stderr: {}", stderr);
}

#[test]
fn test_load_fails_on_broken_index() {
    let (tmp, config) = setup_test_env();
    fs::write(tmp.path().join("repo/index.yaml"), "entries: [1, 2]").unwrap();

    let (_, stderr, success) = run_catalog(&config, &["load", "datascience"]);
    assert!(!success);
    assert!(stderr.contains("datascience"));

    let (_, _, success) = run_catalog(&config, &["load", "nope"]);
    assert!(!success);
}

#[test]
fn test_show_prints_augmented_package() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_catalog(&config, &["show", "datascience", "keepme"]);
    assert!(success, "show failed: {}", stderr);

    let body: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["version"], "3.0.0");
    assert_eq!(
        body["config"]["properties"]["onyxia"]["properties"]["friendlyName"]["default"],
        "keepme"
    );

    let (stdout, _, success) = run_catalog(
        &config,
        &["show", "datascience", "keepme", "--version", "2.0.0"],
    );
    assert!(success);
    let body: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["version"], "2.0.0");
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_catalog(&tmp.path().join("absent.toml"), &["catalogs"]);
    assert!(!success);
    assert!(!stderr.is_empty());
}
