//! End-to-end pipeline for one deployment request

use crate::detect::ChangeDetector;
use crate::error::{DeployError, DeployResult};
use crate::executor::{DeployOutcome, Executor, FileOutcome};
use crate::git::VersionControl;
use crate::identity::Identity;
use sp_core::deployment::DEFAULT_HEAD_REV;
use sp_core::{order_tasks, Config, DeployMode, DeployPlan, DeploymentRequest, FailurePolicy};
use sp_db::{AuditLog, Database};

/// Detects, orders, and executes the scripts for a request
pub struct Deployer<'a> {
    config: &'a Config,
    vcs: &'a dyn VersionControl,
    policy: FailurePolicy,
}

impl<'a> Deployer<'a> {
    /// Uses the failure policy from `config`
    pub fn new(config: &'a Config, vcs: &'a dyn VersionControl) -> Self {
        Self {
            config,
            vcs,
            policy: config.on_failure,
        }
    }

    /// Override the configured failure policy
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Compute the complete, ordered task list. Nothing is executed.
    pub fn plan(&self, request: &DeploymentRequest) -> DeployResult<DeployPlan> {
        let detector = ChangeDetector::new(self.config)?;
        let detected = detector.detect(request, self.vcs)?;
        let tasks = order_tasks(detected);
        log::debug!("Planned {} file(s) for {} deployment", tasks.len(), request.mode);
        Ok(DeployPlan {
            request: request.clone(),
            tasks,
        })
    }

    /// Check that an incremental request targets the checked-out commit.
    /// Script content is always read from the working tree.
    pub fn verify_head(&self, request: &DeploymentRequest) -> DeployResult<()> {
        if request.mode != DeployMode::Incremental || request.head_rev() == DEFAULT_HEAD_REV {
            return Ok(());
        }
        let head_id = self.vcs.resolve_revision(request.head_rev())?;
        let checked_out = self.vcs.resolve_revision(DEFAULT_HEAD_REV)?;
        if head_id != checked_out {
            return Err(DeployError::HeadNotCheckedOut {
                head: request.head_rev().to_string(),
                head_id,
                checked_out,
            });
        }
        Ok(())
    }

    /// Plan and execute `request`
    pub async fn deploy(
        &self,
        request: &DeploymentRequest,
        db: &dyn Database,
        audit: &dyn AuditLog,
        identity: &Identity,
    ) -> DeployResult<DeployOutcome> {
        self.deploy_with(request, db, audit, identity, |_| {}).await
    }

    /// Plan and execute `request`, reporting each file as it completes
    pub async fn deploy_with<F>(
        &self,
        request: &DeploymentRequest,
        db: &dyn Database,
        audit: &dyn AuditLog,
        identity: &Identity,
        on_file: F,
    ) -> DeployResult<DeployOutcome>
    where
        F: FnMut(&FileOutcome),
    {
        let plan = self.plan(request)?;
        self.execute(&plan, db, audit, identity, on_file).await
    }

    /// Execute an already computed plan. Fails before touching the database
    /// when [`Deployer::verify_head`] rejects the plan's request.
    pub async fn execute<F>(
        &self,
        plan: &DeployPlan,
        db: &dyn Database,
        audit: &dyn AuditLog,
        identity: &Identity,
        on_file: F,
    ) -> DeployResult<DeployOutcome>
    where
        F: FnMut(&FileOutcome),
    {
        self.verify_head(&plan.request)?;
        Executor::new(db, audit, identity, self.policy)
            .run_with(plan, on_file)
            .await
    }
}
