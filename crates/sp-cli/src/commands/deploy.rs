//! Deploy command implementation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sp_deploy::{DeployOutcome, Deployer, FileOutcome, GitCli, Identity};
use std::time::Instant;

use crate::cli::{DeployArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{self, ExitCode, EXIT_DEPLOY_FAILED};

/// File name of the per-run summary written under the target directory
const RESULTS_FILE: &str = "deploy_results.json";

/// Summary of one deploy run, written to `target/deploy_results.json`
#[derive(Debug, Serialize)]
struct DeployResults<'a> {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    elapsed_secs: f64,
    target: Option<&'a str>,
    commit_id: &'a str,
    actor: &'a str,
    success_count: usize,
    failure_count: usize,
    #[serde(flatten)]
    outcome: &'a DeployOutcome,
}

/// Execute the deploy command
pub(crate) async fn execute(args: &DeployArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let started_at = Utc::now();
    let project = common::load_project(global)?;
    let vcs = GitCli::new(&project.root);
    let request = args.range.request(&project.root);

    let mut deployer = Deployer::new(&project.config, &vcs);
    if let Some(policy) = args.policy_override() {
        deployer = deployer.with_policy(policy);
    }

    let plan = deployer
        .plan(&request)
        .context("Failed to determine files to deploy")?;
    deployer
        .verify_head(&request)
        .context("Refusing to deploy")?;
    let conn = common::connect(&project, global).await?;
    let identity = Identity::resolve(
        args.commit.as_deref(),
        args.actor.as_deref(),
        &vcs,
        request.head_rev(),
    );
    log::debug!(
        "Deploying as {} at commit {}",
        identity.actor,
        identity.commit_id
    );

    let text = args.output == OutputFormat::Text;
    if text {
        if plan.is_empty() {
            println!("No SQL files to deploy");
        } else {
            println!(
                "Deploying {} file(s) ({}, on failure: {}) at {} by {}\n",
                plan.len(),
                plan.deployment_type(),
                deployer.policy(),
                common::short_commit(&identity.commit_id),
                identity.actor
            );
        }
    }

    let outcome = match deployer
        .execute(&plan, conn.db.as_ref(), &conn.audit, &identity, |file| {
            if text {
                print_file(file);
            }
        })
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            // The audit row for this file is missing, so the history can no
            // longer be trusted: stop immediately.
            eprintln!("Error: {}", e);
            return Err(ExitCode(EXIT_DEPLOY_FAILED).into());
        }
    };

    let results = DeployResults {
        started_at,
        finished_at: Utc::now(),
        elapsed_secs: start_time.elapsed().as_secs_f64(),
        target: conn.target.as_deref(),
        commit_id: &identity.commit_id,
        actor: &identity.actor,
        success_count: outcome.success_count(),
        failure_count: outcome.failure_count(),
        outcome: &outcome,
    };
    let results_path = project.target_dir().join(RESULTS_FILE);
    common::write_json_results(&results_path, &results)?;
    log::debug!("Wrote {}", results_path.display());

    if text {
        print_summary(&outcome, start_time);
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Failed to serialize results")?
        );
    }

    if !outcome.succeeded() {
        return Err(ExitCode(EXIT_DEPLOY_FAILED).into());
    }
    Ok(())
}

fn print_file(file: &FileOutcome) {
    let record = &file.record;
    if record.is_success() {
        println!("  ✓ {} [{}ms]", record.filename, file.duration_ms);
    } else {
        println!(
            "  ✗ {} - {}",
            record.filename,
            record.error_message.as_deref().unwrap_or_default()
        );
    }
}

fn print_summary(outcome: &DeployOutcome, start_time: Instant) {
    if outcome.stopped_early {
        println!(
            "  {} file(s) not attempted after the first failure",
            outcome.not_attempted.len()
        );
    }
    println!();
    println!(
        "Completed: {} succeeded, {} failed",
        outcome.success_count(),
        outcome.failure_count()
    );
    println!("Total time: {}ms", start_time.elapsed().as_millis());
}
