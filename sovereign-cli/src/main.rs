//! Sovereign CLI - Kenyan OSINT exports in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{batch, collect, config, export, logs};

/// Sovereign - export Kenyan OSINT data for journalists, researchers, NGOs and developers
#[derive(Parser)]
#[command(name = "sov", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export records for one user type in one format
    Export {
        /// Path to a JSON file with a record or list of records (reads stdin if omitted)
        file: Option<PathBuf>,
        /// Audience of the export (journalist, researcher, ngo, developer, government)
        #[arg(short, long, default_value = "journalist")]
        user_type: String,
        /// Output format (json, csv, html)
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Grant permission for government exports
        #[arg(long)]
        government_permission: bool,
        /// Directory to write the artifact to (defaults to the configured output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the artifact instead of writing it
        #[arg(long)]
        stdout: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export records across several formats and user types
    Batch {
        /// Path to a JSON file with a record or list of records (reads stdin if omitted)
        file: Option<PathBuf>,
        /// Comma-separated output formats
        #[arg(long, value_delimiter = ',', default_value = "json,csv,html")]
        formats: Vec<String>,
        /// Comma-separated user types
        #[arg(long, value_delimiter = ',', default_value = "journalist,researcher,ngo,developer")]
        user_types: Vec<String>,
        /// Grant permission for government exports
        #[arg(long)]
        government_permission: bool,
        /// Directory to write artifacts to (defaults to the configured output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only report, do not write artifacts
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Collect records for a query from the offline collector
    Collect {
        /// Search query
        query: String,
        /// Collector to use instead of the configured one (basic, comprehensive)
        #[arg(long)]
        collector: Option<String>,
        /// Tag records with this OSINT source type
        #[arg(long)]
        source_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// View and change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export {
            file,
            user_type,
            format,
            government_permission,
            output,
            stdout,
            json,
        } => export::run(
            file.as_deref(),
            &user_type,
            &format,
            government_permission,
            output,
            stdout,
            json,
        ),
        Commands::Batch {
            file,
            formats,
            user_types,
            government_permission,
            output,
            dry_run,
            json,
        } => batch::run(
            file.as_deref(),
            &formats,
            &user_types,
            government_permission,
            output,
            dry_run,
            json,
        ),
        Commands::Collect {
            query,
            collector,
            source_type,
            json,
        } => collect::run(&query, collector.as_deref(), source_type.as_deref(), json),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}
