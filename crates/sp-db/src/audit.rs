//! DuckDB-backed deployment history table.
//!
//! The column layout is a compatibility contract with existing history
//! tables and must not change:
//!
//! | column            | type        |
//! |-------------------|-------------|
//! | `DEPLOYED_AT`     | `TIMESTAMP` |
//! | `FILENAME`        | `VARCHAR`   |
//! | `COMMIT_ID`       | `VARCHAR`   |
//! | `DEPLOYED_BY`     | `VARCHAR`   |
//! | `STATUS`          | `VARCHAR`   |
//! | `DEPLOYMENT_TYPE` | `VARCHAR`   |
//! | `ERROR_MESSAGE`   | `VARCHAR`   |
//!
//! The log runs on its own session, so transactions or `USE` statements left
//! behind by deployed scripts never reach the history rows. The table name is
//! fully qualified with the catalog and schema resolved when the log is opened.

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use crate::traits::AuditLog;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use sp_core::config::is_valid_table_name;
use sp_core::{DeployStatus, DeploymentRecord, DeploymentType};
use std::sync::Mutex;

/// DuckDB timestamps carry microseconds
const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// `CAST(ts AS VARCHAR)` omits the fraction when it is zero
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Deployment history stored in a DuckDB table
pub struct DuckDbAuditLog {
    conn: Mutex<Connection>,
    table: String,
    /// `"catalog"."schema"`
    schema: String,
    /// `"catalog"."schema"."table"`
    qualified: String,
}

impl DuckDbAuditLog {
    /// Attach to `table` (optionally `schema.table`) in the database behind `db`.
    ///
    /// Opens a dedicated session; an unqualified table lives in that
    /// session's default schema.
    pub fn new(db: &DuckDbBackend, table: &str) -> DbResult<Self> {
        if !is_valid_table_name(table) {
            return Err(DbError::AuditError(format!(
                "invalid audit table name '{}'",
                table
            )));
        }

        let conn = db.try_clone_connection()?;
        let (catalog, default_schema): (String, String) = conn
            .query_row("SELECT current_database(), current_schema()", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .map_err(|e| DbError::AuditError(format!("failed to resolve audit schema: {}", e)))?;

        let (schema, name) = match table.split_once('.') {
            Some((schema, name)) => (schema, name),
            None => (default_schema.as_str(), table),
        };
        let schema = format!("{}.{}", quote_ident(&catalog), quote_ident(schema));
        let qualified = format!("{}.{}", schema, quote_ident(name));
        log::debug!("Audit log table {}", qualified);

        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
            schema,
            qualified,
        })
    }

    /// Name of the history table as configured
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Catalog and schema qualified name the log reads and writes
    pub fn qualified_table(&self) -> &str {
        &self.qualified
    }

    fn with_conn<F, T>(&self, body: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        body(&conn)
    }

    fn ensure_table_sync(&self) -> DbResult<()> {
        let mut ddl = format!("CREATE SCHEMA IF NOT EXISTS {};\n", self.schema);
        ddl.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                DEPLOYED_AT     TIMESTAMP NOT NULL,
                FILENAME        VARCHAR NOT NULL,
                COMMIT_ID       VARCHAR,
                DEPLOYED_BY     VARCHAR,
                STATUS          VARCHAR NOT NULL,
                DEPLOYMENT_TYPE VARCHAR NOT NULL,
                ERROR_MESSAGE   VARCHAR
            );",
            self.qualified
        ));
        self.with_conn(|conn| {
            conn.execute_batch(&ddl).map_err(|e| {
                DbError::AuditError(format!("failed to create {}: {}", self.table, e))
            })
        })
    }

    fn append_sync(&self, record: &DeploymentRecord) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (DEPLOYED_AT, FILENAME, COMMIT_ID, DEPLOYED_BY, STATUS, DEPLOYMENT_TYPE, ERROR_MESSAGE)
             VALUES (CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, ?)",
            self.qualified
        );
        let timestamp = record.timestamp.format(TIMESTAMP_WRITE_FORMAT).to_string();
        self.with_conn(|conn| {
            conn.execute(
                &sql,
                duckdb::params![
                    timestamp,
                    record.filename,
                    record.commit_id,
                    record.actor,
                    record.status.as_str(),
                    record.deployment_type.as_str(),
                    record.error_message,
                ],
            )
            .map_err(|e| {
                DbError::AuditError(format!(
                    "failed to record {} in {}: {}",
                    record.filename, self.table, e
                ))
            })?;
            Ok(())
        })
    }

    fn history_sync(&self, limit: usize) -> DbResult<Vec<DeploymentRecord>> {
        let sql = format!(
            "SELECT CAST(DEPLOYED_AT AS VARCHAR), FILENAME, COMMIT_ID, DEPLOYED_BY, STATUS, DEPLOYMENT_TYPE, ERROR_MESSAGE
             FROM {}
             ORDER BY DEPLOYED_AT DESC, rowid DESC
             LIMIT {}",
            self.qualified, limit
        );
        let query_err = |e: duckdb::Error| {
            DbError::AuditError(format!("failed to read {}: {}", self.table, e))
        };

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(query_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(RawRow {
                        deployed_at: row.get(0)?,
                        filename: row.get(1)?,
                        commit_id: row.get(2)?,
                        actor: row.get(3)?,
                        status: row.get(4)?,
                        deployment_type: row.get(5)?,
                        error_message: row.get(6)?,
                    })
                })
                .map_err(query_err)?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(query_err)?.into_record()?);
            }
            Ok(records)
        })
    }
}

/// A history row as read back from DuckDB, before validation
struct RawRow {
    deployed_at: String,
    filename: String,
    commit_id: Option<String>,
    actor: Option<String>,
    status: String,
    deployment_type: String,
    error_message: Option<String>,
}

impl RawRow {
    fn into_record(self) -> DbResult<DeploymentRecord> {
        let timestamp = NaiveDateTime::parse_from_str(&self.deployed_at, TIMESTAMP_READ_FORMAT)
            .map_err(|e| {
                DbError::AuditError(format!(
                    "unreadable DEPLOYED_AT '{}': {}",
                    self.deployed_at, e
                ))
            })?;
        let status = DeployStatus::parse(&self.status)
            .ok_or_else(|| DbError::AuditError(format!("unknown STATUS '{}'", self.status)))?;
        let deployment_type = DeploymentType::parse(&self.deployment_type).ok_or_else(|| {
            DbError::AuditError(format!(
                "unknown DEPLOYMENT_TYPE '{}'",
                self.deployment_type
            ))
        })?;

        Ok(DeploymentRecord {
            timestamp: DateTime::<Utc>::from_naive_utc_and_offset(timestamp, Utc),
            filename: self.filename,
            commit_id: self.commit_id.unwrap_or_default(),
            actor: self.actor.unwrap_or_default(),
            status,
            deployment_type,
            error_message: self.error_message,
        })
    }
}

/// Double-quote an identifier, doubling embedded quotes
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[async_trait]
impl AuditLog for DuckDbAuditLog {
    async fn ensure_table(&self) -> DbResult<()> {
        self.ensure_table_sync()
    }

    async fn append(&self, record: &DeploymentRecord) -> DbResult<()> {
        self.append_sync(record)
    }

    async fn history(&self, limit: usize) -> DbResult<Vec<DeploymentRecord>> {
        self.history_sync(limit)
    }
}

#[cfg(test)]
#[path = "audit_test.rs"]
mod tests;
