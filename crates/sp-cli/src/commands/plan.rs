//! Plan command implementation: the ordered file list, without touching the database

use anyhow::{Context, Result};
use serde::Serialize;
use sp_core::{DeployMode, DeploymentType, FileTask};
use sp_deploy::{Deployer, GitCli};

use crate::cli::{GlobalArgs, OutputFormat, PlanArgs};
use crate::commands::common;

#[derive(Debug, Serialize)]
struct PlanOutput<'a> {
    deployment_type: DeploymentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    head: Option<&'a str>,
    files: &'a [FileTask],
}

/// Execute the plan command
pub(crate) async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let vcs = GitCli::new(&project.root);
    let request = args.range.request(&project.root);

    let plan = Deployer::new(&project.config, &vcs)
        .plan(&request)
        .context("Failed to determine files to deploy")?;

    match args.output {
        OutputFormat::Json => {
            let (base, head) = match request.mode {
                DeployMode::Incremental => (Some(request.base_rev()), Some(request.head_rev())),
                DeployMode::Full => (None, None),
            };
            let output = PlanOutput {
                deployment_type: plan.deployment_type(),
                base,
                head,
                files: &plan.tasks,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialize plan")?
            );
        }
        OutputFormat::Text => {
            if plan.is_empty() {
                println!("No SQL files to deploy");
                return Ok(());
            }
            match request.mode {
                DeployMode::Incremental => println!(
                    "{} file(s) changed between {} and {}:",
                    plan.len(),
                    request.base_rev(),
                    request.head_rev()
                ),
                DeployMode::Full => println!("{} file(s) in full deployment:", plan.len()),
            }
            for (idx, task) in plan.tasks.iter().enumerate() {
                println!("  {:>3}. {}", idx + 1, task);
            }
        }
    }

    Ok(())
}
