//! sp-core - Core library for sqlpush
//!
//! This crate provides the shared types used across all sqlpush components:
//! project configuration, the deployment data model (requests, file tasks,
//! audit records), deployment ordering, and content checksums.

pub mod checksum;
pub mod config;
pub mod deployment;
pub mod error;
pub mod ordering;

pub use checksum::compute_checksum;
pub use config::{AuditConfig, Config, DatabaseConfig, DbType, FailurePolicy, TargetConfig};
pub use deployment::{
    DeployMode, DeployPlan, DeployStatus, DeploymentRecord, DeploymentRequest, DeploymentType,
    FileTask,
};
pub use error::{CoreError, CoreResult};
pub use ordering::order_tasks;
