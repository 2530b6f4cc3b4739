use super::*;

fn global(project_dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.display().to_string(),
        config: None,
        target: None,
    }
}

#[test]
fn test_load_project_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_project(&global(&dir.path().join("nope")))
        .err()
        .unwrap();
    assert!(err.to_string().contains("[C004]"));
}

#[test]
fn test_load_project_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_project(&global(dir.path())).err().unwrap();
    assert!(format!("{:#}", err).contains("[C001]"));
}

#[test]
fn test_load_project_with_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("deploy.yml");
    std::fs::write(&config_path, "name: warehouse\ntarget_path: out\n").unwrap();

    let mut args = global(dir.path());
    args.config = Some(config_path.display().to_string());
    let project = load_project(&args).unwrap();
    assert_eq!(project.config.name, "warehouse");
    assert_eq!(project.target_dir(), dir.path().join("out"));
}

#[test]
fn test_resolve_db_path() {
    let root = Path::new("/repo");
    assert_eq!(resolve_db_path(root, ":memory:"), ":memory:");
    assert_eq!(
        resolve_db_path(root, "warehouse.duckdb"),
        Path::new("/repo").join("warehouse.duckdb").display().to_string()
    );
    let absolute = std::env::temp_dir().join("x.duckdb");
    assert_eq!(
        resolve_db_path(root, &absolute.display().to_string()),
        absolute.display().to_string()
    );
}

#[test]
fn test_short_commit() {
    assert_eq!(
        short_commit("0123456789abcdef0123456789abcdef01234567"),
        "0123456789ab"
    );
    assert_eq!(short_commit("unknown"), "unknown");
}

#[test]
fn test_calculate_column_widths() {
    let widths = calculate_column_widths(
        &["STATUS", "FILE"],
        &[vec!["SUCCESS".into(), "sql/a.sql".into()]],
    );
    assert_eq!(widths, vec![7, 9]);
}

#[tokio::test]
async fn test_connect_creates_audit_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("sqlpush.yml"),
        "name: warehouse\ndatabase:\n  path: warehouse.duckdb\naudit:\n  table: ops.HISTORY\n",
    )
    .unwrap();
    let args = global(dir.path());
    let project = load_project(&args).unwrap();
    let conn = connect(&project, &args).await.unwrap();

    assert!(dir.path().join("warehouse.duckdb").exists());
    assert_eq!(conn.audit.table(), "ops.HISTORY");
    assert!(conn.audit.history(5).await.unwrap().is_empty());
}
