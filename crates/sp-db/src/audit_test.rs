use super::*;
use sp_core::FileTask;

fn audit_log(table: &str) -> (DuckDbBackend, DuckDbAuditLog) {
    let db = DuckDbBackend::in_memory().unwrap();
    let log = DuckDbAuditLog::new(&db, table).unwrap();
    (db, log)
}

fn record(path: &str) -> DeploymentRecord {
    DeploymentRecord::success(&FileTask::new(path), "c", "a", DeploymentType::Full)
}

#[tokio::test]
async fn test_ensure_table_is_idempotent() {
    let (db, log) = audit_log("DEPLOYMENT_HISTORY");
    log.ensure_table().await.unwrap();
    log.ensure_table().await.unwrap();
    assert_eq!(db.query_count("SELECT * FROM DEPLOYMENT_HISTORY").unwrap(), 0);
}

#[tokio::test]
async fn test_column_layout() {
    let (db, log) = audit_log("DEPLOYMENT_HISTORY");
    log.ensure_table().await.unwrap();

    let columns: Vec<String> = db
        .with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT column_name FROM information_schema.columns
                 WHERE table_name = 'DEPLOYMENT_HISTORY' ORDER BY ordinal_position",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
        .unwrap();

    assert_eq!(
        columns,
        vec![
            "DEPLOYED_AT",
            "FILENAME",
            "COMMIT_ID",
            "DEPLOYED_BY",
            "STATUS",
            "DEPLOYMENT_TYPE",
            "ERROR_MESSAGE"
        ]
    );
}

#[tokio::test]
async fn test_append_and_read_back() {
    let (_db, log) = audit_log("DEPLOYMENT_HISTORY");
    log.ensure_table().await.unwrap();

    let ok = DeploymentRecord::success(
        &FileTask::new("00_Schema/core.sql"),
        "abc123",
        "ci-bot",
        DeploymentType::Normal,
    );
    let failed = DeploymentRecord::failure(
        &FileTask::new("01_Table/orders.sql"),
        "abc123",
        "ci-bot",
        DeploymentType::Normal,
        "Catalog Error: Table with name orders already exists!",
    );
    log.append(&ok).await.unwrap();
    log.append(&failed).await.unwrap();

    let history = log.history(10).await.unwrap();
    assert_eq!(history.len(), 2);

    // newest first
    assert_eq!(history[0].filename, "01_Table/orders.sql");
    assert_eq!(history[0].status, DeployStatus::Failure);
    assert_eq!(
        history[0].error_message.as_deref(),
        Some("Catalog Error: Table with name orders already exists!")
    );
    assert_eq!(history[1].filename, "00_Schema/core.sql");
    assert_eq!(history[1].status, DeployStatus::Success);
    assert!(history[1].error_message.is_none());
    assert_eq!(history[1].commit_id, "abc123");
    assert_eq!(history[1].actor, "ci-bot");
    assert_eq!(history[1].deployment_type, DeploymentType::Normal);

    let drift = (history[1].timestamp - ok.timestamp).num_milliseconds().abs();
    assert!(drift < 1, "timestamp should survive to the microsecond");
}

#[tokio::test]
async fn test_history_limit() {
    let (_db, log) = audit_log("DEPLOYMENT_HISTORY");
    log.ensure_table().await.unwrap();
    for i in 0..5 {
        let task = FileTask::new(format!("{:02}_x.sql", i));
        log.append(&DeploymentRecord::success(
            &task,
            "c",
            "a",
            DeploymentType::Full,
        ))
        .await
        .unwrap();
    }
    let history = log.history(2).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].filename, "04_x.sql");
}

#[tokio::test]
async fn test_schema_qualified_table() {
    let (db, log) = audit_log("ops.DEPLOYMENT_HISTORY");
    log.ensure_table().await.unwrap();
    log.append(&DeploymentRecord::success(
        &FileTask::new("00_Schema/core.sql"),
        "c",
        "a",
        DeploymentType::Full,
    ))
    .await
    .unwrap();
    assert_eq!(
        db.query_count("SELECT * FROM ops.DEPLOYMENT_HISTORY").unwrap(),
        1
    );
}

#[tokio::test]
async fn test_append_without_table_is_audit_error() {
    let (_db, log) = audit_log("MISSING_HISTORY");
    let err = log
        .append(&DeploymentRecord::success(
            &FileTask::new("00_Schema/core.sql"),
            "c",
            "a",
            DeploymentType::Full,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::AuditError(_)));
}

#[test]
fn test_rejects_invalid_table_name() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(DuckDbAuditLog::new(&db, "x; DROP TABLE y").is_err());
}

#[test]
fn test_table_is_fully_qualified() {
    let (_db, log) = audit_log("DEPLOYMENT_HISTORY");
    assert_eq!(log.table(), "DEPLOYMENT_HISTORY");
    assert_eq!(
        log.qualified_table(),
        "\"memory\".\"main\".\"DEPLOYMENT_HISTORY\""
    );

    let (_db, log) = audit_log("ops.HISTORY");
    assert_eq!(log.qualified_table(), "\"memory\".\"ops\".\"HISTORY\"");
}

#[tokio::test]
async fn test_append_ignores_open_transaction_on_target() {
    let (db, log) = audit_log("DEPLOYMENT_HISTORY");
    log.ensure_table().await.unwrap();

    // Leave a transaction open on the target session, then abandon it.
    db.with_conn(|conn| Ok(conn.execute_batch("BEGIN TRANSACTION; CREATE TABLE t (i INT);")?))
        .unwrap();
    log.append(&record("00_a.sql")).await.unwrap();
    db.with_conn(|conn| Ok(conn.execute_batch("ROLLBACK")?))
        .unwrap();

    let history = log.history(10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].filename, "00_a.sql");
}

#[tokio::test]
async fn test_append_ignores_use_on_target() {
    let (db, log) = audit_log("DEPLOYMENT_HISTORY");
    log.ensure_table().await.unwrap();

    db.with_conn(|conn| {
        Ok(conn.execute_batch(
            "CREATE SCHEMA s; CREATE TABLE s.DEPLOYMENT_HISTORY (x INT); USE s;",
        )?)
    })
    .unwrap();
    log.append(&record("00_a.sql")).await.unwrap();

    assert_eq!(log.history(10).await.unwrap().len(), 1);
    assert_eq!(
        db.query_count("SELECT * FROM memory.main.DEPLOYMENT_HISTORY").unwrap(),
        1
    );
    assert_eq!(
        db.query_count("SELECT * FROM memory.s.DEPLOYMENT_HISTORY").unwrap(),
        0
    );
}
