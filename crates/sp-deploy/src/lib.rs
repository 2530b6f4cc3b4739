//! sp-deploy - Deployment pipeline for sqlpush
//!
//! Change Detector → Ordering Stage → Executor → Audit Logger, strictly
//! sequential:
//!
//! - [`detect`] finds the scripts to deploy (git diff or filesystem walk)
//! - [`sp_core::order_tasks`] sorts them by path
//! - [`executor`] applies them one at a time and appends one audit record each
//! - [`deployer`] ties the stages together for a [`sp_core::DeploymentRequest`]

pub mod deployer;
pub mod detect;
pub mod error;
pub mod executor;
pub mod git;
pub mod identity;

pub use deployer::Deployer;
pub use detect::ChangeDetector;
pub use error::{DeployError, DeployResult};
pub use executor::{DeployOutcome, Executor, FileOutcome};
pub use git::{GitCli, VersionControl};
pub use identity::Identity;
