//! Error types for sp-deploy

use sp_core::CoreError;
use sp_db::DbError;
use thiserror::Error;

/// Deployment pipeline errors
#[derive(Error, Debug)]
pub enum DeployError {
    /// Version control query failed (P001)
    #[error("[P001] Version control query failed: {0}")]
    VersionControl(String),

    /// Script could not be read (P002)
    #[error("[P002] Failed to read '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// Audit record could not be written (P003)
    #[error("[P003] Failed to record deployment of '{filename}': {source}")]
    Logging {
        filename: String,
        #[source]
        source: DbError,
    },

    /// SQL directory could not be scanned (P004)
    #[error("[P004] Failed to scan '{path}': {source}")]
    Scan {
        path: String,
        source: std::io::Error,
    },

    /// Incremental head is not the checked-out commit (P005)
    #[error(
        "[P005] Head revision '{head}' ({head_id}) is not the checked-out commit ({checked_out}); \
         scripts are read from the working tree, so check out '{head}' before deploying"
    )]
    HeadNotCheckedOut {
        head: String,
        head_id: String,
        checked_out: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type alias for DeployError
pub type DeployResult<T> = Result<T, DeployError>;
