//! Deployment data model: requests, file tasks, and audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Revision used as the incremental base when none is given
pub const DEFAULT_BASE_REV: &str = "HEAD~1";

/// Revision used as the incremental head when none is given
pub const DEFAULT_HEAD_REV: &str = "HEAD";

/// How the set of files to deploy is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    /// Only files added or modified between two revisions
    Incremental,
    /// Every recognised file under the SQL root
    Full,
}

impl DeployMode {
    /// Deployment type tag written to the audit table for this mode
    pub fn deployment_type(&self) -> DeploymentType {
        match self {
            DeployMode::Incremental => DeploymentType::Normal,
            DeployMode::Full => DeploymentType::Full,
        }
    }
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployMode::Incremental => write!(f, "incremental"),
            DeployMode::Full => write!(f, "full"),
        }
    }
}

/// A request to deploy a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// Incremental or full
    pub mode: DeployMode,

    /// Project root (the directory containing sqlpush.yml)
    pub root: PathBuf,

    /// Base revision for incremental mode
    pub base: Option<String>,

    /// Head revision for incremental mode
    pub head: Option<String>,
}

impl DeploymentRequest {
    /// Incremental deployment between `base` and `head` (defaults applied lazily)
    pub fn incremental(
        root: impl Into<PathBuf>,
        base: Option<String>,
        head: Option<String>,
    ) -> Self {
        Self {
            mode: DeployMode::Incremental,
            root: root.into(),
            base,
            head,
        }
    }

    /// Full deployment of every recognised file
    pub fn full(root: impl Into<PathBuf>) -> Self {
        Self {
            mode: DeployMode::Full,
            root: root.into(),
            base: None,
            head: None,
        }
    }

    /// Base revision, falling back to `HEAD~1`
    pub fn base_rev(&self) -> &str {
        self.base.as_deref().unwrap_or(DEFAULT_BASE_REV)
    }

    /// Head revision, falling back to `HEAD`
    pub fn head_rev(&self) -> &str {
        self.head.as_deref().unwrap_or(DEFAULT_HEAD_REV)
    }
}

/// A single script scheduled for deployment.
///
/// The path is relative to the project root and always `/`-separated, so it
/// doubles as the ordering key and the audit `FILENAME`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTask {
    path: String,
}

impl FileTask {
    /// Create a task from a relative path, normalising `\` separators to `/`
    pub fn new(path: impl Into<String>) -> Self {
        let path: String = path.into();
        let path = path.replace('\\', "/");
        let path = path.strip_prefix("./").map(String::from).unwrap_or(path);
        Self { path }
    }

    /// Relative path (also the ordering key)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Ordering key: the full relative path
    pub fn ordering_key(&self) -> &str {
        &self.path
    }

    /// Absolute location of the script under `root`
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.path
            .split('/')
            .fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Display for FileTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Outcome of a single file deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILURE")]
    Failure,
}

impl DeployStatus {
    /// Value stored in the audit table `STATUS` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStatus::Success => "SUCCESS",
            DeployStatus::Failure => "FAILURE",
        }
    }

    /// Parse the audit table representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(DeployStatus::Success),
            "FAILURE" => Some(DeployStatus::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment type tag distinguishing incremental from full runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentType {
    #[serde(rename = "NORMAL DEPLOY")]
    Normal,
    #[serde(rename = "FULL DEPLOY")]
    Full,
}

impl DeploymentType {
    /// Value stored in the audit table `DEPLOYMENT_TYPE` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentType::Normal => "NORMAL DEPLOY",
            DeploymentType::Full => "FULL DEPLOY",
        }
    }

    /// Parse the audit table representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NORMAL DEPLOY" => Some(DeploymentType::Normal),
            "FULL DEPLOY" => Some(DeploymentType::Full),
            _ => None,
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the audit table. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub timestamp: DateTime<Utc>,
    pub filename: String,
    pub commit_id: String,
    pub actor: String,
    pub status: DeployStatus,
    pub deployment_type: DeploymentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DeploymentRecord {
    /// Record for a file that deployed cleanly
    pub fn success(
        task: &FileTask,
        commit_id: &str,
        actor: &str,
        deployment_type: DeploymentType,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            filename: task.path().to_string(),
            commit_id: commit_id.to_string(),
            actor: actor.to_string(),
            status: DeployStatus::Success,
            deployment_type,
            error_message: None,
        }
    }

    /// Record for a failed file. An empty message is replaced so the row
    /// always carries something to investigate.
    pub fn failure(
        task: &FileTask,
        commit_id: &str,
        actor: &str,
        deployment_type: DeploymentType,
        error: impl Into<String>,
    ) -> Self {
        let error: String = error.into();
        let error = if error.trim().is_empty() {
            "unknown error".to_string()
        } else {
            error
        };
        Self {
            timestamp: Utc::now(),
            filename: task.path().to_string(),
            commit_id: commit_id.to_string(),
            actor: actor.to_string(),
            status: DeployStatus::Failure,
            deployment_type,
            error_message: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeployStatus::Success
    }
}

/// Ordered file tasks for one run, fixed before execution starts
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub request: DeploymentRequest,
    pub tasks: Vec<FileTask>,
}

impl DeployPlan {
    pub fn deployment_type(&self) -> DeploymentType {
        self.request.mode.deployment_type()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
#[path = "deployment_test.rs"]
mod tests;
