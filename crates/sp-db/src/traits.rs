//! Collaborator traits for the deployment target and the audit table

use crate::error::DbResult;
use async_trait::async_trait;
use sp_core::DeploymentRecord;

/// Deployment target.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a whole script (one or more statements) as a single unit
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Append-only deployment history.
///
/// Rows are only ever inserted; nothing here updates or deletes them.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Create the history table if it does not exist
    async fn ensure_table(&self) -> DbResult<()>;

    /// Append one record
    async fn append(&self, record: &DeploymentRecord) -> DbResult<()>;

    /// Most recent records first, at most `limit`
    async fn history(&self, limit: usize) -> DbResult<Vec<DeploymentRecord>>;
}
