//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::config::SearchProfile;
use crate::results::{ResultRow, ResultsTable, RowOutcome};
use crate::storage::SessionRecord;
use crate::types::SearchWindow;
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print a finished session in human-readable plain text format.
pub fn print_plain(record: &SessionRecord) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Header
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(
        out,
        "                  {} Session Results",
        style("landrec").cyan().bold()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    // Session info
    writeln!(out, "  {} {}", style("Profile:").bold(), record.profile)?;
    writeln!(out, "  {} {}", style("Locality:").bold(), record.locality)?;
    writeln!(out, "  {} {}", style("Window:").bold(), record.window())?;
    writeln!(
        out,
        "  {} {}",
        style("Session ID:").bold(),
        style(record.id.short()).dim()
    )?;
    writeln!(out)?;

    // Statistics
    writeln!(
        out,
        "  {} {} rows in {:.2}s",
        style("Statistics:").bold(),
        record.rows_seen,
        record.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "               {} addresses, {} processed, {} failed",
        style(record.results.extracted_count()).green().bold(),
        record.rows_processed,
        style(record.rows_failed).red()
    )?;
    if record.stopped_early {
        writeln!(
            out,
            "               {}",
            style("stopped before the last row").yellow()
        )?;
    }
    writeln!(out)?;

    write_table(&mut out, &record.results)?;

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print only the deduplicated results table.
pub fn print_table(table: &ResultsTable) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out)?;
    write_table(&mut out, table)?;
    writeln!(out)?;
    Ok(())
}

fn write_table(out: &mut impl Write, table: &ResultsTable) -> io::Result<()> {
    let rows = table.deduplicated();
    if rows.is_empty() {
        writeln!(out, "  {}", style("No addresses extracted.").dim())?;
        return Ok(());
    }

    writeln!(out, "  {}", style(THIN_RULE).dim())?;
    writeln!(
        out,
        "  {:<28}  {}",
        style("FILENAME").bold(),
        style("EXTRACTED ADDRESS").bold()
    )?;
    writeln!(out, "  {}", style(THIN_RULE).dim())?;

    for row in rows {
        writeln!(
            out,
            "  {:<28}  {}",
            truncate_string(&row.filename, 28),
            outcome_style(row.outcome).apply_to(&row.address)
        )?;
    }

    writeln!(out, "  {}", style(THIN_RULE).dim())?;
    Ok(())
}

fn outcome_style(outcome: RowOutcome) -> Style {
    match outcome {
        RowOutcome::Extracted => Style::new().green(),
        RowOutcome::NoText => Style::new().yellow(),
        RowOutcome::OcrFailed | RowOutcome::LlmFailed => Style::new().red(),
    }
}

/// Print one row as soon as it is appended.
pub fn print_row(row: &ResultRow) {
    let marker = match row.outcome {
        RowOutcome::Extracted => style("+").green().bold(),
        RowOutcome::NoText => style("?").yellow().bold(),
        RowOutcome::OcrFailed | RowOutcome::LlmFailed => style("!").red().bold(),
    };
    println!(
        "{} {}  {}",
        marker,
        style(&row.filename).dim(),
        outcome_style(row.outcome).apply_to(&row.address)
    );
}

/// Print a session header before the browser starts.
pub fn print_session_header(profile: &SearchProfile, window: SearchWindow) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("landrec").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Profile: {}",
        style("•").dim(),
        style(&profile.name).yellow()
    );
    println!(
        "{} Locality: {} ({})",
        style("•").dim(),
        style(&profile.locality).white().bold(),
        profile.record_category
    );
    println!(
        "{} Recorded {} ({} instrument types)",
        style("•").dim(),
        style(window).white().bold(),
        profile.instrument_types.len()
    );
    println!();
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum number of characters, adding an ellipsis
/// if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
