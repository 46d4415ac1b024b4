//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `landrec run` - Log in, search and extract addresses from every row
//! - `landrec extract <PDF>...` - Extract addresses from local PDFs
//! - `landrec profiles list|show|create|delete` - Manage search profiles
//! - `landrec history` - View archived sessions
//! - `landrec export <session-id>` - Export an archived session

mod export;
mod extract;
mod profiles;
mod run;

pub use export::ExportCommand;
pub use extract::ExtractCommand;
pub use profiles::ProfilesCommand;
pub use run::RunCommand;

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output;
use crate::storage::SessionStore;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

/// landrec - land-record address harvester.
///
/// Logs into a court records portal, downloads every document a saved
/// search returns, reads each scan with OCR and asks a language model for
/// the property's mailing address.
#[derive(Parser, Debug)]
#[command(name = "landrec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Harvest mailing addresses from land-record documents", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load settings from `--config` or the default location.
    pub fn settings(&self) -> CliResult<AppSettings> {
        let settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };
        Ok(settings)
    }

    /// Run the selected subcommand.
    pub async fn execute(&self) -> CliResult<()> {
        let settings = self.settings()?;

        match &self.command {
            Commands::Run(cmd) => cmd.execute(&settings, self.quiet).await,
            Commands::Extract(cmd) => cmd.execute(&settings, self.quiet).await,
            Commands::Profiles(cmd) => cmd.execute(self.quiet),
            Commands::History(cmd) => cmd.execute(self.quiet),
            Commands::Export(cmd) => cmd.execute(self.quiet),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a search on the portal and extract addresses from every result
    #[command(alias = "r")]
    Run(RunCommand),

    /// Extract addresses from PDFs already on disk
    #[command(alias = "x")]
    Extract(ExtractCommand),

    /// Manage search profiles
    #[command(alias = "p")]
    Profiles(ProfilesCommand),

    /// View session history
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export session results
    #[command(alias = "e")]
    Export(ExportCommand),
}

/// View and manage session history.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent sessions to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Show detailed information for each session
    #[arg(short, long)]
    pub detailed: bool,

    /// Clear all session history
    #[arg(long)]
    pub clear: bool,

    /// Delete sessions older than N days
    #[arg(long, value_name = "DAYS")]
    pub prune: Option<u32>,
}

impl HistoryCommand {
    /// Execute the history command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = SessionStore::new()?;

        if self.clear {
            let ids = store.list_ids()?;
            for id in &ids {
                store.delete(id)?;
            }
            if !quiet {
                output::print_success(&format!("Deleted {} session(s)", ids.len()));
            }
            return Ok(());
        }

        if let Some(days) = self.prune {
            let deleted = store.cleanup(chrono::Duration::days(i64::from(days)))?;
            if !quiet {
                output::print_success(&format!(
                    "Deleted {} session(s) older than {} days",
                    deleted, days
                ));
            }
            return Ok(());
        }

        let records = store.list_recent(self.count)?;
        if records.is_empty() {
            if !quiet {
                println!("No sessions recorded yet.");
            }
            return Ok(());
        }

        if !quiet {
            println!(
                "\n{:<10} {:<18} {}",
                style("ID").bold(),
                style("STARTED").bold(),
                style("SUMMARY").bold()
            );
            println!("{}", "-".repeat(70));
        }

        for record in &records {
            println!(
                "{:<10} {:<18} {}",
                style(record.id.short()).dim(),
                record.started_at.format("%Y-%m-%d %H:%M"),
                record.summary()
            );

            if self.detailed {
                for row in record.results.deduplicated() {
                    println!(
                        "{:<29} {}  {}",
                        "",
                        output::truncate_string(&row.filename, 28),
                        row.address
                    );
                }
            }
        }

        if !quiet {
            println!();
        }

        Ok(())
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV with `Filename` and `Extracted Address` columns
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_flags() {
        let cli = Cli::try_parse_from(["landrec", "history", "-n", "3", "--detailed"]).unwrap();
        match cli.command {
            Commands::History(cmd) => {
                assert_eq!(cmd.count, 3);
                assert!(cmd.detailed);
                assert!(cmd.prune.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["landrec", "-v", "-q", "history"]).is_err());
    }
}
