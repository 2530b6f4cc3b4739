//! Version control collaborator and its git CLI implementation

use crate::error::{DeployError, DeployResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Object id of git's empty tree, used as the base for a branch's first push
pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Queries the deployment needs from version control
pub trait VersionControl {
    /// Paths added, copied, modified, or renamed between `base` and `head`,
    /// limited to `pathspec` and relative to the project root.
    ///
    /// Deleted paths must never be returned.
    fn changed_files(&self, base: &str, head: &str, pathspec: &str) -> DeployResult<Vec<String>>;

    /// Full commit id for `rev`
    fn resolve_revision(&self, rev: &str) -> DeployResult<String>;
}

/// `git` invoked as a subprocess in the project directory
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn run(&self, args: &[&str]) -> DeployResult<Vec<u8>> {
        log::debug!("git -C {} {}", self.root.display(), args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| DeployError::VersionControl(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::VersionControl(format!(
                "git {} exited with {}: {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// GitHub reports an all-zero `before` revision when a branch is first pushed
pub fn is_null_revision(rev: &str) -> bool {
    rev.len() >= 40 && rev.bytes().all(|b| b == b'0')
}

/// Split `-z` output into paths
fn parse_nul_separated(stdout: &[u8]) -> DeployResult<Vec<String>> {
    stdout
        .split(|b| *b == 0)
        .filter(|p| !p.is_empty())
        .map(|p| {
            String::from_utf8(p.to_vec()).map_err(|_| {
                DeployError::VersionControl(format!(
                    "non UTF-8 path in git output: {}",
                    String::from_utf8_lossy(p)
                ))
            })
        })
        .collect()
}

impl VersionControl for GitCli {
    fn changed_files(&self, base: &str, head: &str, pathspec: &str) -> DeployResult<Vec<String>> {
        let base = if is_null_revision(base) {
            log::warn!("Base revision {} is null, diffing against the empty tree", base);
            EMPTY_TREE
        } else {
            base
        };

        let stdout = self.run(&[
            "diff",
            "--name-only",
            "-z",
            "--relative",
            "--diff-filter=ACMR",
            base,
            head,
            "--",
            pathspec,
        ])?;
        parse_nul_separated(&stdout)
    }

    fn resolve_revision(&self, rev: &str) -> DeployResult<String> {
        let stdout = self.run(&["rev-parse", "--verify", rev])?;
        let id = String::from_utf8_lossy(&stdout).trim().to_string();
        if id.is_empty() {
            return Err(DeployError::VersionControl(format!(
                "git rev-parse returned nothing for {}",
                rev
            )));
        }
        Ok(id)
    }
}
