//! Integration tests that drive the sqlpush binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn sqlpush(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlpush"))
        .arg("--project-dir")
        .arg(project)
        .args(args)
        .env_remove("SQLPUSH_TARGET")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sqlpush")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "sqlpush.yml",
        "name: warehouse\ndatabase:\n  path: warehouse.duckdb\non_failure: continue\n",
    );
    write(root, "sql/00_Schema/core.sql", "CREATE SCHEMA IF NOT EXISTS core;");
    write(
        root,
        "sql/01_Table/orders.sql",
        "CREATE TABLE IF NOT EXISTS core.orders (id INTEGER);",
    );
    write(root, "sql/01_Table/readme.md", "not deployed");
    dir
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn test_full_deploy_then_history() {
    let dir = project();
    let out = sqlpush(
        dir.path(),
        &["deploy", "--full", "--commit", "abc123", "--actor", "ci-bot"],
    );
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("✓ sql/00_Schema/core.sql"));
    assert!(stdout.contains("Completed: 2 succeeded, 0 failed"));

    let results: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("target/deploy_results.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(results["deployment_type"], "FULL DEPLOY");
    assert_eq!(results["success_count"], 2);
    assert_eq!(results["files"].as_array().unwrap().len(), 2);
    assert_eq!(results["files"][0]["checksum"].as_str().unwrap().len(), 64);

    let out = sqlpush(dir.path(), &["history", "--output", "json"]);
    assert!(out.status.success());
    let history = json(&out);
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["filename"], "sql/01_Table/orders.sql");
    assert_eq!(rows[0]["status"], "SUCCESS");
    assert_eq!(rows[0]["commit_id"], "abc123");
    assert_eq!(rows[0]["actor"], "ci-bot");
}

#[test]
fn test_failed_file_exits_with_four() {
    let dir = project();
    write(dir.path(), "sql/01_Table/orders.sql", "CREATE TABLE broken (");

    let out = sqlpush(
        dir.path(),
        &["deploy", "--full", "--commit", "abc123", "--actor", "ci-bot"],
    );
    assert_eq!(out.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&out.stdout).contains("✗ sql/01_Table/orders.sql"));

    let out = sqlpush(dir.path(), &["history", "--output", "json", "--limit", "1"]);
    let history = json(&out);
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "FAILURE");
    assert!(!rows[0]["error_message"].as_str().unwrap().is_empty());
}

#[test]
fn test_fail_fast_leaves_later_files_unattempted() {
    let dir = project();
    write(dir.path(), "sql/00_Schema/core.sql", "CREATE SCHEMA broken (");

    let out = sqlpush(
        dir.path(),
        &["deploy", "--full", "--fail-fast", "--commit", "c", "--actor", "a", "-o", "json"],
    );
    assert_eq!(out.status.code(), Some(4));
    let results = json(&out);
    assert_eq!(results["stopped_early"], true);
    assert_eq!(results["not_attempted"][0], "sql/01_Table/orders.sql");
    assert_eq!(results["files"].as_array().unwrap().len(), 1);
}

#[test]
fn test_plan_does_not_touch_database() {
    let dir = project();
    let out = sqlpush(dir.path(), &["plan", "--full", "--output", "json"]);
    assert!(out.status.success());
    let plan = json(&out);
    assert_eq!(plan["deployment_type"], "FULL DEPLOY");
    assert_eq!(
        plan["files"],
        serde_json::json!(["sql/00_Schema/core.sql", "sql/01_Table/orders.sql"])
    );
    assert!(!dir.path().join("warehouse.duckdb").exists());
}

#[test]
fn test_missing_config_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let out = sqlpush(dir.path(), &["plan", "--full"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("[C001]"));
}

#[test]
fn test_unknown_target_exits_with_one() {
    let dir = project();
    let out = sqlpush(dir.path(), &["--target", "prod", "history"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Target 'prod' not found"));
}
