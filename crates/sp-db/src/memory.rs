//! In-memory fakes for [`Database`] and [`AuditLog`].
//!
//! Available to this crate's tests and, through the `test-support` feature,
//! to downstream crates' tests.

use crate::error::{DbError, DbResult};
use crate::traits::{AuditLog, Database};
use async_trait::async_trait;
use sp_core::DeploymentRecord;
use std::sync::Mutex;

/// Records every script it receives; rejects scripts containing a configured marker.
#[derive(Default)]
pub struct MemoryDatabase {
    executed: Mutex<Vec<String>>,
    failures: Vec<(String, String)>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any script containing `marker` with `message`
    pub fn fail_when_contains(mut self, marker: &str, message: &str) -> Self {
        self.failures.push((marker.to_string(), message.to_string()));
        self
    }

    /// Scripts executed so far, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    fn run(&self, sql: &str) -> DbResult<()> {
        if let Some((_, message)) = self.failures.iter().find(|(m, _)| sql.contains(m)) {
            return Err(DbError::ExecutionError(message.clone()));
        }
        self.executed
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?
            .push(sql.to_string());
        Ok(())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.run(sql)
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }
}

/// Append-only vector of records; can be told to start failing after N appends.
#[derive(Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<DeploymentRecord>>,
    fail_after: Option<usize>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` appends, then reject every further one
    pub fn failing_after(n: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_after: Some(n),
        }
    }

    /// Records appended so far, oldest first
    pub fn records(&self) -> Vec<DeploymentRecord> {
        self.records
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn ensure_table(&self) -> DbResult<()> {
        Ok(())
    }

    async fn append(&self, record: &DeploymentRecord) -> DbResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        if self.fail_after.is_some_and(|n| records.len() >= n) {
            return Err(DbError::AuditError(format!(
                "history table unavailable while recording {}",
                record.filename
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn history(&self, limit: usize) -> DbResult<Vec<DeploymentRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
