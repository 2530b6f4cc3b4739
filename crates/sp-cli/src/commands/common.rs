//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use sp_core::{Config, CoreError, DatabaseConfig};
use sp_db::{AuditLog, DuckDbAuditLog, DuckDbBackend};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors (open database connections) run before exiting.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the command has already reported the failure.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Exit code when any file or the audit write failed
pub(crate) const EXIT_DEPLOY_FAILED: i32 = 4;

/// A loaded project: its root directory and parsed configuration
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Directory results files are written to
    pub(crate) fn target_dir(&self) -> PathBuf {
        self.config.target_path_absolute(&self.root)
    }
}

/// Load a project from the directory specified in global CLI arguments.
///
/// `--config` points at an explicit file; otherwise `sqlpush.yml` (or
/// `.yaml`) is looked up in the project directory.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    if !root.is_dir() {
        return Err(CoreError::ProjectNotFound {
            path: global.project_dir.clone(),
        }
        .into());
    }

    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project")?;

    Ok(Project { root, config })
}

/// Open target database and audit log, both scoped to one command run
pub(crate) struct Connection {
    pub(crate) db: Arc<DuckDbBackend>,
    pub(crate) audit: DuckDbAuditLog,
    pub(crate) target: Option<String>,
}

/// Connect to the database for the resolved target and prepare the audit table.
///
/// Target priority: `--target` flag > `SQLPUSH_TARGET` > base `database` config.
pub(crate) async fn connect(project: &Project, global: &GlobalArgs) -> Result<Connection> {
    let target = Config::resolve_target(global.target.as_deref());
    let db_config = project
        .config
        .get_database_config(target.as_deref())
        .context("Failed to resolve database configuration")?;
    let audit_config = project
        .config
        .get_audit_config(target.as_deref())
        .context("Failed to resolve audit configuration")?;

    let db_config = DatabaseConfig {
        path: resolve_db_path(&project.root, &db_config.path),
        ..db_config
    };
    if global.verbose {
        eprintln!(
            "[verbose] Target {} ({} at {})",
            target.as_deref().unwrap_or("default"),
            db_config.db_type,
            db_config.path
        );
    }

    let db = sp_db::connect(&db_config).context("Failed to connect to database")?;
    let audit = DuckDbAuditLog::new(&db, &audit_config.table)
        .context("Failed to open audit log")?;
    if audit_config.create_if_missing {
        audit
            .ensure_table()
            .await
            .context("Failed to create audit table")?;
    }

    Ok(Connection { db, audit, target })
}

/// DuckDB file paths in the config are relative to the project root
fn resolve_db_path(root: &Path, path: &str) -> String {
    if path == ":memory:" || Path::new(path).is_absolute() {
        path.to_string()
    } else {
        root.join(path).display().to_string()
    }
}

/// Write a serializable value as pretty-printed JSON, creating parent directories.
pub(crate) fn write_json_results<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create target directory")?;
    }
    let json = serde_json::to_string_pretty(data).context("Failed to serialize results")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Abbreviate a commit id for display
pub(crate) fn short_commit(commit: &str) -> &str {
    commit.get(..12).unwrap_or(commit)
}

// ---------------------------------------------------------------------------
// Table-printing utilities
// ---------------------------------------------------------------------------

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Print a left-aligned table to stdout: header row, dashes, then the rows.
/// Columns are separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    println!("{}", format_row(headers.iter().copied(), &widths));
    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));
    for row in rows {
        println!("{}", format_row(row.iter().map(String::as_str), &widths));
    }
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
        .collect();
    parts.join("  ").trim_end().to_string()
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
