//! Executor: applies planned scripts in order and records every attempt.
//!
//! Each file is read, submitted as one batch, and turned into exactly one
//! [`DeploymentRecord`] which is appended to the audit log before the next
//! file starts. There is no transaction spanning files: a failure never rolls
//! back files that already succeeded.

use crate::error::{DeployError, DeployResult};
use crate::identity::Identity;
use serde::Serialize;
use sp_core::{
    compute_checksum, DeployPlan, DeploymentRecord, DeploymentType, FailurePolicy, FileTask,
};
use sp_db::{AuditLog, Database};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// Result of one attempted file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub record: DeploymentRecord,
    /// SHA-256 of the script content, absent when it could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub duration_ms: u64,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub run_id: Uuid,
    pub deployment_type: DeploymentType,
    pub files: Vec<FileOutcome>,
    /// Tasks never attempted because the run stopped early
    pub not_attempted: Vec<FileTask>,
    pub stopped_early: bool,
}

impl DeployOutcome {
    /// True when every attempted file succeeded and nothing was left out
    pub fn succeeded(&self) -> bool {
        self.failure_count() == 0 && self.not_attempted.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.files.iter().filter(|f| f.record.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.files.len() - self.success_count()
    }

    /// Audit records in the order they were appended
    pub fn records(&self) -> impl Iterator<Item = &DeploymentRecord> {
        self.files.iter().map(|f| &f.record)
    }
}

/// Sequential script executor
pub struct Executor<'a> {
    db: &'a dyn Database,
    audit: &'a dyn AuditLog,
    identity: &'a Identity,
    policy: FailurePolicy,
}

impl<'a> Executor<'a> {
    pub fn new(
        db: &'a dyn Database,
        audit: &'a dyn AuditLog,
        identity: &'a Identity,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            db,
            audit,
            identity,
            policy,
        }
    }

    /// Execute `plan` without per-file notifications
    pub async fn run(&self, plan: &DeployPlan) -> DeployResult<DeployOutcome> {
        self.run_with(plan, |_| {}).await
    }

    /// Execute `plan`, calling `on_file` after each file's record is appended.
    ///
    /// Per-file read and execution failures are captured in the records.
    /// A failed audit append aborts the run with [`DeployError::Logging`].
    pub async fn run_with<F>(
        &self,
        plan: &DeployPlan,
        mut on_file: F,
    ) -> DeployResult<DeployOutcome>
    where
        F: FnMut(&FileOutcome),
    {
        let run_id = Uuid::new_v4();
        let deployment_type = plan.deployment_type();
        log::info!(
            "Deployment {} ({}) of {} file(s) against {}",
            run_id,
            deployment_type,
            plan.len(),
            self.db.db_type()
        );

        let mut files = Vec::with_capacity(plan.len());
        let mut stopped_at = None;

        for (idx, task) in plan.tasks.iter().enumerate() {
            let outcome = self.apply(&plan.request.root, task, deployment_type).await;

            self.audit
                .append(&outcome.record)
                .await
                .map_err(|e| DeployError::Logging {
                    filename: task.path().to_string(),
                    source: e,
                })?;

            let failed = !outcome.record.is_success();
            on_file(&outcome);
            files.push(outcome);

            if failed && !self.policy.continues() {
                stopped_at = Some(idx + 1);
                break;
            }
        }

        let not_attempted: Vec<FileTask> = stopped_at
            .map(|next| plan.tasks[next..].to_vec())
            .unwrap_or_default();
        if !not_attempted.is_empty() {
            log::warn!(
                "Stopped after first failure, {} file(s) not attempted",
                not_attempted.len()
            );
        }

        Ok(DeployOutcome {
            run_id,
            deployment_type,
            files,
            stopped_early: !not_attempted.is_empty(),
            not_attempted,
        })
    }

    /// Read and execute one script, producing its record
    async fn apply(
        &self,
        root: &Path,
        task: &FileTask,
        deployment_type: DeploymentType,
    ) -> FileOutcome {
        let start = Instant::now();
        let commit = &self.identity.commit_id;
        let actor = &self.identity.actor;

        let path = task.resolve(root);
        let sql = match std::fs::read_to_string(&path) {
            Ok(sql) => sql,
            Err(e) => {
                let err = DeployError::FileRead {
                    path: task.path().to_string(),
                    source: e,
                };
                log::debug!("{}", err);
                return FileOutcome {
                    record: DeploymentRecord::failure(
                        task,
                        commit,
                        actor,
                        deployment_type,
                        err.to_string(),
                    ),
                    checksum: None,
                    duration_ms: start.elapsed().as_millis() as u64,
                };
            }
        };

        let checksum = compute_checksum(&sql);
        log::debug!("Executing {} ({} bytes)", task, sql.len());
        let record = match self.db.execute_batch(&sql).await {
            Ok(()) => DeploymentRecord::success(task, commit, actor, deployment_type),
            Err(e) => {
                log::debug!("{} failed: {}", task, e);
                DeploymentRecord::failure(task, commit, actor, deployment_type, e.to_string())
            }
        };

        FileOutcome {
            record,
            checksum: Some(checksum),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
