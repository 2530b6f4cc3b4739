//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Lock the connection, mapping a poisoned mutex to an error
    pub(crate) fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Run `body` against the locked connection
    pub(crate) fn with_conn<F, T>(&self, body: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self.lock()?;
        body(&conn)
    }

    /// Open another session on the same database.
    ///
    /// The new session shares data but not session state: open transactions
    /// and `USE` on this connection do not affect it.
    pub fn try_clone_connection(&self) -> DbResult<Connection> {
        self.with_conn(|conn| {
            conn.try_clone()
                .map_err(|e| DbError::ConnectionError(e.to_string()))
        })
    }

    /// Execute batch SQL synchronously.
    ///
    /// A script may not leave a transaction open: it is rolled back and the
    /// script is reported as failed.
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        self.with_conn(|conn| match conn.execute_batch(sql) {
            Ok(()) => {
                if rollback_open_transaction(conn) {
                    return Err(DbError::ExecutionError(
                        "script left a transaction open; its changes were rolled back"
                            .to_string(),
                    ));
                }
                Ok(())
            }
            Err(e) => {
                rollback_open_transaction(conn);
                Err(DbError::ExecutionError(e.to_string()))
            }
        })
    }

    /// Query a single count, used by tests and sanity checks
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                    row.get(0)
                })
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
            Ok(count as usize)
        })
    }
}

/// Roll back whatever transaction is still open on `conn`.
///
/// Returns true when one was open. DuckDB rejects `ROLLBACK` outside a
/// transaction, which is the common case and not an error here.
fn rollback_open_transaction(conn: &Connection) -> bool {
    match conn.execute_batch("ROLLBACK") {
        Ok(()) => {
            log::warn!("Rolled back a transaction left open by the last script");
            true
        }
        Err(_) => false,
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
