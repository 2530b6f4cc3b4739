//! Error types for sp-core

use thiserror::Error;

/// Core error type for sqlpush
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Project directory not found
    #[error("[C004] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// C005: SQL root directory not found
    #[error("[C005] SQL directory not found: {path}")]
    SqlPathNotFound { path: String },

    /// C006: Invalid exclude pattern
    #[error("[C006] Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// C007: IO error
    #[error("[C007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C008: IO error with file path context
    #[error("[C008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
