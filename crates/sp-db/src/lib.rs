//! sp-db - Database layer for sqlpush
//!
//! This crate provides the two collaborator traits the deployer talks to,
//! [`Database`] (the deployment target) and [`AuditLog`] (the deployment
//! history table), together with their DuckDB implementations. In-memory
//! fakes live in [`memory`] behind the `test-support` feature.

pub mod audit;
pub mod duckdb;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod traits;

pub use audit::DuckDbAuditLog;
pub use self::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{AuditLog, Database};

use sp_core::{DatabaseConfig, DbType};
use std::sync::Arc;

/// Open the deployment target described by `config`.
///
/// Only DuckDB is implemented; Snowflake targets are recognised so that
/// configuration parses, but connecting reports [`DbError::NotImplemented`].
pub fn connect(config: &DatabaseConfig) -> DbResult<Arc<DuckDbBackend>> {
    match config.db_type {
        DbType::DuckDb => {
            log::debug!("Opening DuckDB target at {}", config.path);
            Ok(Arc::new(DuckDbBackend::new(&config.path)?))
        }
        DbType::Snowflake => Err(DbError::NotImplemented {
            backend: DbType::Snowflake.to_string(),
            feature: "connection".to_string(),
        }),
    }
}
