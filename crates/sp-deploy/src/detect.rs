//! Change detection: which scripts belong to a deployment.
//!
//! Incremental mode asks version control for the files touched between two
//! revisions; full mode walks the SQL directory and ignores history entirely.
//! Both modes apply the same extension and exclude filters and return an
//! unordered set of tasks.

use crate::error::{DeployError, DeployResult};
use crate::git::VersionControl;
use sp_core::{Config, CoreError, DeployMode, DeploymentRequest, FileTask};
use std::collections::HashSet;
use std::path::Path;

/// Glob options for exclude patterns: `*` stays within one path segment
const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Finds deployable scripts according to a project's configuration
pub struct ChangeDetector<'a> {
    config: &'a Config,
    sql_path: &'a str,
    exclude: Vec<glob::Pattern>,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(config: &'a Config) -> DeployResult<Self> {
        Ok(Self {
            config,
            sql_path: config.sql_path.trim_end_matches('/'),
            exclude: config.exclude_patterns()?,
        })
    }

    /// Detect the task set for `request`
    pub fn detect(
        &self,
        request: &DeploymentRequest,
        vcs: &dyn VersionControl,
    ) -> DeployResult<HashSet<FileTask>> {
        match request.mode {
            DeployMode::Incremental => {
                self.incremental(vcs, request.base_rev(), request.head_rev())
            }
            DeployMode::Full => self.full(&request.root),
        }
    }

    /// Files added or modified between `base` and `head`. Deletions never appear.
    pub fn incremental(
        &self,
        vcs: &dyn VersionControl,
        base: &str,
        head: &str,
    ) -> DeployResult<HashSet<FileTask>> {
        let changed = vcs.changed_files(base, head, self.sql_path)?;
        log::debug!(
            "{} path(s) changed between {} and {}",
            changed.len(),
            base,
            head
        );
        Ok(self.filter(changed.into_iter().map(FileTask::new)))
    }

    /// Every recognised file under the SQL directory of `root`
    pub fn full(&self, root: &Path) -> DeployResult<HashSet<FileTask>> {
        let sql_root = root.join(self.sql_path);
        if !sql_root.is_dir() {
            return Err(CoreError::SqlPathNotFound {
                path: sql_root.display().to_string(),
            }
            .into());
        }

        let mut found = Vec::new();
        walk(&sql_root, self.sql_path, &mut found)?;
        log::debug!("{} file(s) found under {}", found.len(), sql_root.display());
        Ok(self.filter(found.into_iter().map(FileTask::new)))
    }

    fn filter(&self, tasks: impl Iterator<Item = FileTask>) -> HashSet<FileTask> {
        tasks
            .filter(|t| self.config.has_recognized_extension(t.path()))
            .filter(|t| {
                let excluded = self.is_excluded(t.path());
                if excluded {
                    log::debug!("Excluding {}", t);
                }
                !excluded
            })
            .collect()
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }
}

/// Recursively collect files under `dir`, recording `/`-joined paths prefixed with `rel`.
fn walk(dir: &Path, rel: &str, found: &mut Vec<String>) -> DeployResult<()> {
    let scan_err = |e: std::io::Error| DeployError::Scan {
        path: dir.display().to_string(),
        source: e,
    };

    for entry in std::fs::read_dir(dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            log::warn!("Skipping non UTF-8 path {}", path.display());
            continue;
        };
        let child = format!("{}/{}", rel, name);

        let file_type = entry.file_type().map_err(scan_err)?;
        if file_type.is_dir() {
            walk(&path, &child, found)?;
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            found.push(child);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "detect_test.rs"]
mod tests;
