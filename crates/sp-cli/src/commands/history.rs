//! History command implementation

use anyhow::{Context, Result};
use sp_db::AuditLog;

use crate::cli::{GlobalArgs, HistoryArgs, OutputFormat};
use crate::commands::common;

/// Execute the history command
pub(crate) async fn execute(args: &HistoryArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let conn = common::connect(&project, global).await?;

    let records = conn
        .audit
        .history(args.limit)
        .await
        .context("Failed to read deployment history")?;

    match args.output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&records).context("Failed to serialize history")?
        ),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No deployments recorded in {}", conn.audit.table());
                return Ok(());
            }
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| {
                    vec![
                        r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        r.status.to_string(),
                        r.deployment_type.to_string(),
                        r.filename.clone(),
                        common::short_commit(&r.commit_id).to_string(),
                        r.actor.clone(),
                        r.error_message.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            common::print_table(
                &["DEPLOYED_AT", "STATUS", "TYPE", "FILENAME", "COMMIT", "BY", "ERROR"],
                &rows,
            );
        }
    }

    Ok(())
}
