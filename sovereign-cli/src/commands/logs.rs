//! Logs command - view and manage the export event log

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_sovereign_dir;
use sovereign_core::services::logging::now_ms;
use sovereign_core::services::LogFilter;
use sovereign_core::{EntryPoint, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failures
        #[arg(long)]
        errors: bool,
        /// Only this event (e.g. export_completed, export_failed)
        #[arg(long)]
        event: Option<String>,
        /// Only exports for this user type
        #[arg(long)]
        user_type: Option<String>,
        /// Only exports in this format
        #[arg(long)]
        format: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear old log entries
    Clear {
        /// Delete logs older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let sovereign_dir = get_sovereign_dir()?;
    std::fs::create_dir_all(&sovereign_dir)?;
    LoggingService::new(&sovereign_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{TimeZone, Utc};
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = get_logging_service()?;

    match command {
        LogsCommands::List {
            limit,
            errors,
            event,
            user_type,
            format,
            json,
        } => {
            let filter = LogFilter {
                event,
                user_type,
                format,
                errors_only: errors,
                since_ms: None,
                limit,
            };
            let entries = service.entries(&filter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Time", "Event", "User type", "Format", "Details"]);

            for entry in &entries {
                let details = entry
                    .error_details
                    .as_deref()
                    .or(entry.command.as_deref())
                    .unwrap_or("");
                let event = if entry.error_message.is_some() {
                    entry.event.red().to_string()
                } else {
                    entry.event.clone()
                };

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    event,
                    entry.user_type.clone().unwrap_or_default(),
                    entry.format.clone().unwrap_or_default(),
                    details.to_string(),
                ]);
            }

            println!("{}", table);

            if !errors {
                let failures: Vec<_> = entries.iter().filter(|e| e.error_message.is_some()).collect();
                if !failures.is_empty() {
                    println!();
                    println!("{}", "Recent Failures:".red().bold());
                    for err in failures.iter().take(3) {
                        println!(
                            "  {} [{}]: {}",
                            format_timestamp(err.timestamp).dimmed(),
                            err.event,
                            err.error_message.as_deref().unwrap_or("Unknown error")
                        );
                    }
                }
            }
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let cutoff_ms = now_ms() - (older_than_days as i64 * 24 * 60 * 60 * 1000);

            if !force && !json {
                use dialoguer::Confirm;
                if !Confirm::new()
                    .with_prompt(format!("Delete logs older than {} days?", older_than_days))
                    .default(false)
                    .interact()?
                {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = service.delete_before(cutoff_ms)?;

            if json {
                println!("{}", serde_json::json!({"deleted": deleted}));
            } else {
                println!("Deleted {} log entries", deleted);
            }
        }
        LogsCommands::Stats { json } => {
            let total = service.count()?;
            let tallies = service.export_tallies()?;
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": total,
                        "exports": tallies,
                        "database_path": db_path.to_string_lossy(),
                        "database_size_bytes": size_bytes
                    })
                );
                return Ok(());
            }

            println!("{}", "Log Statistics".bold());
            println!("  Total entries: {}", total);
            println!("  Database: {}", db_path.display());
            println!("  Size: {}", crate::output::format_size(size_bytes));

            if !tallies.is_empty() {
                let mut table = Table::new();
                table.set_content_arrangement(ContentArrangement::Dynamic);
                table.set_header(vec!["User type", "Format", "Completed", "Failed"]);
                for tally in &tallies {
                    let failed = if tally.failed > 0 {
                        tally.failed.to_string().red().to_string()
                    } else {
                        "0".to_string()
                    };
                    table.add_row(vec![
                        tally.user_type.clone(),
                        tally.format.clone(),
                        tally.completed.to_string(),
                        failed,
                    ]);
                }
                println!();
                println!("{}", table);
            }
        }
    }

    Ok(())
}
