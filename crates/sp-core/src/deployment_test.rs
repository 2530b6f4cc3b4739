use super::*;

#[test]
fn test_file_task_normalises_separators() {
    let task = FileTask::new("sql\\01_Table\\orders.sql");
    assert_eq!(task.path(), "sql/01_Table/orders.sql");
    assert_eq!(task.ordering_key(), task.path());

    let task = FileTask::new("./sql/00_Schema/core.sql");
    assert_eq!(task.path(), "sql/00_Schema/core.sql");
}

#[test]
fn test_file_task_resolve() {
    let root = Path::new("/repo");
    let task = FileTask::new("sql/01_Table/orders.sql");
    assert_eq!(
        task.resolve(root),
        Path::new("/repo").join("sql").join("01_Table").join("orders.sql")
    );
}

#[test]
fn test_mode_maps_to_deployment_type() {
    assert_eq!(
        DeployMode::Incremental.deployment_type(),
        DeploymentType::Normal
    );
    assert_eq!(DeployMode::Full.deployment_type(), DeploymentType::Full);
    assert_eq!(DeploymentType::Normal.as_str(), "NORMAL DEPLOY");
    assert_eq!(DeploymentType::Full.as_str(), "FULL DEPLOY");
}

#[test]
fn test_status_round_trips_through_audit_strings() {
    for status in [DeployStatus::Success, DeployStatus::Failure] {
        assert_eq!(DeployStatus::parse(status.as_str()), Some(status));
    }
    for kind in [DeploymentType::Normal, DeploymentType::Full] {
        assert_eq!(DeploymentType::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(DeployStatus::parse("success"), None);
}

#[test]
fn test_request_revision_defaults() {
    let req = DeploymentRequest::incremental("/repo", None, None);
    assert_eq!(req.base_rev(), "HEAD~1");
    assert_eq!(req.head_rev(), "HEAD");

    let req = DeploymentRequest::incremental(
        "/repo",
        Some("abc123".to_string()),
        Some("def456".to_string()),
    );
    assert_eq!(req.base_rev(), "abc123");
    assert_eq!(req.head_rev(), "def456");

    let req = DeploymentRequest::full("/repo");
    assert_eq!(req.mode, DeployMode::Full);
}

#[test]
fn test_failure_record_always_has_message() {
    let task = FileTask::new("00_Schema/core.sql");
    let record =
        DeploymentRecord::failure(&task, "abc", "ci-bot", DeploymentType::Normal, "   ");
    assert_eq!(record.status, DeployStatus::Failure);
    assert_eq!(record.error_message.as_deref(), Some("unknown error"));
    assert!(!record.is_success());

    let record = DeploymentRecord::success(&task, "abc", "ci-bot", DeploymentType::Full);
    assert!(record.is_success());
    assert_eq!(record.filename, "00_Schema/core.sql");
    assert!(record.error_message.is_none());
}

#[test]
fn test_record_json_uses_audit_strings() {
    let task = FileTask::new("01_Table/orders.sql");
    let record = DeploymentRecord::failure(
        &task,
        "abc",
        "ci-bot",
        DeploymentType::Full,
        "table already exists",
    );
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"status\":\"FAILURE\""));
    assert!(json.contains("\"deployment_type\":\"FULL DEPLOY\""));
    assert!(json.contains("\"error_message\":\"table already exists\""));
}
