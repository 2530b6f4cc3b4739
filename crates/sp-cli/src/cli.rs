//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use sp_core::{DeploymentRequest, FailurePolicy};
use std::path::Path;

/// sqlpush - Deploy versioned SQL scripts in order and keep a deployment history
#[derive(Parser, Debug)]
#[command(name = "sqlpush")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target (database connection)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy changed (or all) SQL scripts and record each attempt
    Deploy(DeployArgs),

    /// Show the ordered scripts a deployment would run, without running them
    Plan(PlanArgs),

    /// Show recorded deployments, newest first
    History(HistoryArgs),
}

/// Which scripts a run covers
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// Deploy every script under the SQL directory, ignoring history
    #[arg(long, conflicts_with_all = ["base", "head"])]
    pub full: bool,

    /// Base revision of the change range (default: HEAD~1)
    #[arg(long)]
    pub base: Option<String>,

    /// Head revision of the change range (default: HEAD). Deploying requires
    /// it to be the checked-out commit.
    #[arg(long)]
    pub head: Option<String>,
}

impl RangeArgs {
    /// Build the deployment request for a project rooted at `root`
    pub fn request(&self, root: &Path) -> DeploymentRequest {
        if self.full {
            DeploymentRequest::full(root)
        } else {
            DeploymentRequest::incremental(root, self.base.clone(), self.head.clone())
        }
    }
}

/// Arguments for the deploy command
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Commit id stamped on audit records (default: GITHUB_SHA, then git)
    #[arg(long)]
    pub commit: Option<String>,

    /// Actor stamped on audit records (default: GITHUB_ACTOR, then USER)
    #[arg(long)]
    pub actor: Option<String>,

    /// Keep deploying after a file fails
    #[arg(long, conflicts_with = "fail_fast")]
    pub continue_on_failure: bool,

    /// Stop at the first failed file
    #[arg(long)]
    pub fail_fast: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl DeployArgs {
    /// Failure policy forced by flags, if any
    pub fn policy_override(&self) -> Option<FailurePolicy> {
        if self.continue_on_failure {
            Some(FailurePolicy::Continue)
        } else if self.fail_fast {
            Some(FailurePolicy::Stop)
        } else {
            None
        }
    }
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of records to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
