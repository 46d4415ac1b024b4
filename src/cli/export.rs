//! Export subcommand implementation.
//!
//! Handles the `landrec export <session-id>` command for exporting archived
//! session results.

use crate::cli::OutputFormat;
use crate::error::{CliResult, StorageError};
use crate::output;
use crate::storage::{SessionRecord, SessionStore};
use crate::types::SessionId;
use clap::Parser;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

/// Export session results.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Session ID or prefix to export
    ///
    /// Can be a full UUID or the first few characters (short ID).
    #[arg(value_name = "SESSION_ID")]
    pub session_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = SessionStore::new()?;

        let record = if self.session_id.len() < SessionId::FULL_LEN {
            store.find_by_prefix(&self.session_id)?
        } else {
            let id: SessionId = self.session_id.parse()?;
            store.load(&id)?
        };

        let content = match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&record).map_err(StorageError::from)?
            }
            OutputFormat::Csv => record.results.to_csv()?,
            OutputFormat::Plain => generate_plain(&record),
        };

        if let Some(ref path) = self.output_file {
            fs::write(path, &content)?;

            if !quiet {
                output::print_success(&format!(
                    "Exported session {} to {}",
                    record.id.short(),
                    path.display()
                ));
            }
        } else {
            print!("{}", content);
        }

        Ok(())
    }
}

/// Generate an unstyled text report.
fn generate_plain(record: &SessionRecord) -> String {
    let mut report = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(report, "Session Report: {}", record.id);
    let _ = writeln!(report, "{}\n", "=".repeat(60));
    let _ = writeln!(report, "Profile:      {}", record.profile);
    let _ = writeln!(report, "Locality:     {}", record.locality);
    let _ = writeln!(report, "Window:       {}", record.window());
    let _ = writeln!(report, "Started:      {}", record.started_at);
    let _ = writeln!(report, "Completed:    {}", record.completed_at);
    let _ = writeln!(report, "Duration:     {} ms\n", record.duration_ms);
    let _ = writeln!(
        report,
        "Summary: {} rows, {} processed, {} failed{}\n",
        record.rows_seen,
        record.rows_processed,
        record.rows_failed,
        if record.stopped_early { " (stopped early)" } else { "" }
    );

    let rows = record.results.deduplicated();
    if !rows.is_empty() {
        let _ = writeln!(report, "Results:");
        let _ = writeln!(report, "{}", "-".repeat(60));
        let _ = writeln!(report, "{:<28}  {}", "FILENAME", "EXTRACTED ADDRESS");
        let _ = writeln!(report, "{}", "-".repeat(60));

        for row in rows {
            let _ = writeln!(
                report,
                "{:<28}  {}",
                output::truncate_string(&row.filename, 28),
                row.address
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchProfile;
    use crate::results::ResultRow;
    use crate::types::SearchWindow;

    #[test]
    fn test_generate_plain_lists_unique_rows() {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut record = SessionRecord::new(
            &SearchProfile::norfolk_deeds(),
            SearchWindow::lookback(today, 90),
        );
        record.results.push(ResultRow::extracted("a.pdf", "1 Main St"));
        record.results.push(ResultRow::extracted("a.pdf", "1 Main St"));

        let text = generate_plain(&record);
        assert!(text.contains("Profile:      norfolk-deeds"));
        assert!(text.contains("Window:       12/16/2023 - 03/15/2024"));
        assert_eq!(text.matches("1 Main St").count(), 1);
    }
}
