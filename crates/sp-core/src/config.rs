//! Configuration types and parsing for sqlpush.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Environment variable consulted when no `--target` flag is given
pub const TARGET_ENV_VAR: &str = "SQLPUSH_TARGET";

/// Config file names looked up in the project directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["sqlpush.yml", "sqlpush.yaml"];

/// Main project configuration from sqlpush.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory containing the versioned SQL scripts, relative to the project root
    #[serde(default = "default_sql_path")]
    pub sql_path: String,

    /// File extensions recognised as deployable scripts (without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns (relative to the project root) excluded from deployment
    #[serde(default)]
    pub exclude: Vec<String>,

    /// What to do after a file fails to deploy
    #[serde(default)]
    pub on_failure: FailurePolicy,

    /// Output directory for deploy results
    #[serde(default = "default_target_path")]
    pub target_path: String,

    /// Audit table settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Audit table override
    #[serde(default)]
    pub audit: Option<AuditConfig>,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// Snowflake
    Snowflake,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::Snowflake => write!(f, "snowflake"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type (duckdb or snowflake)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (for DuckDB file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

/// Audit (deployment history) table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Table name, optionally schema-qualified
    #[serde(default = "default_audit_table")]
    pub table: String,

    /// Create the table when it does not exist yet
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            table: default_audit_table(),
            create_if_missing: true,
        }
    }
}

/// Behaviour of the executor after a file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failed file (default)
    #[default]
    Stop,
    /// Attempt every remaining file
    Continue,
}

impl FailurePolicy {
    /// Returns true if execution proceeds past a failed file
    pub fn continues(&self) -> bool {
        matches!(self, FailurePolicy::Continue)
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Stop => write!(f, "stop"),
            FailurePolicy::Continue => write!(f, "continue"),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

/// Default audit table name
pub const DEFAULT_AUDIT_TABLE: &str = "DEPLOYMENT_HISTORY";

fn default_sql_path() -> String {
    "sql".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["sql".to_string()]
}

fn default_target_path() -> String {
    "target".to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_true() -> bool {
    true
}

fn default_audit_table() -> String {
    DEFAULT_AUDIT_TABLE.to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sqlpush.yml or sqlpush.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
            .map(|p| Self::load(&p))
            .unwrap_or_else(|| {
                Err(CoreError::ConfigNotFound {
                    path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                })
            })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.sql_path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "sql_path cannot be empty".to_string(),
            });
        }

        let sql_path = Path::new(&self.sql_path);
        if sql_path.is_absolute()
            || sql_path.has_root()
            || sql_path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "sql_path '{}' must be a relative path inside the project",
                    self.sql_path
                ),
            });
        }

        if self.extensions.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one extension must be specified".to_string(),
            });
        }

        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "Invalid extension '{}': use the bare extension, e.g. 'sql'",
                    bad
                ),
            });
        }

        for pattern in &self.exclude {
            glob::Pattern::new(pattern).map_err(|e| CoreError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        let audit_configs = std::iter::once(&self.audit)
            .chain(self.targets.values().filter_map(|t| t.audit.as_ref()));
        for audit in audit_configs {
            if !is_valid_table_name(&audit.table) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "Invalid audit table name '{}': expected [schema.]table made of letters, digits and underscores",
                        audit.table
                    ),
                });
            }
        }

        Ok(())
    }

    /// Compiled exclude patterns
    pub fn exclude_patterns(&self) -> CoreResult<Vec<glob::Pattern>> {
        self.exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| CoreError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Get absolute SQL root relative to a project root
    pub fn sql_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.sql_path)
    }

    /// Get absolute target path relative to a project root
    pub fn target_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.target_path)
    }

    /// Returns true if `path` carries one of the configured extensions (case-insensitive)
    pub fn has_recognized_extension(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }

    /// Get the list of available target names
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn target_config(&self, name: &str) -> CoreResult<&TargetConfig> {
        self.targets
            .get(name)
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: format!(
                    "Target '{}' not found. Available targets: {}",
                    name,
                    self.available_targets().join(", ")
                ),
            })
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => Ok(self
                .target_config(name)?
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone())),
            None => Ok(self.database.clone()),
        }
    }

    /// Get audit configuration, optionally applying target overrides
    pub fn get_audit_config(&self, target: Option<&str>) -> CoreResult<AuditConfig> {
        match target {
            Some(name) => Ok(self
                .target_config(name)?
                .audit
                .clone()
                .unwrap_or_else(|| self.audit.clone())),
            None => Ok(self.audit.clone()),
        }
    }

    /// Resolve target from CLI flag or SQLPUSH_TARGET environment variable
    ///
    /// Priority: CLI flag > SQLPUSH_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }
}

/// `[schema.]table`, each part an identifier of ASCII letters, digits, underscores.
///
/// The audit table name is interpolated into SQL, so nothing else is accepted.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|p| {
            !p.is_empty()
                && !p.starts_with(|c: char| c.is_ascii_digit())
                && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
