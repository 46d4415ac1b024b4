//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of session
//! results. Plain output is styled with `console`; JSON and CSV are meant
//! for piping.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::print_csv;
pub use json_format::print_json;
pub use plain::{
    print_info, print_plain, print_row, print_session_header, print_success,
    print_warning, truncate_string,
};

use crate::cli::OutputFormat;
use crate::results::ResultsTable;
use crate::storage::SessionRecord;
use std::io;

/// Format and print a finished session according to the specified format.
pub fn print_results(record: &SessionRecord, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => print_plain(record),
        OutputFormat::Json => print_json(record),
        OutputFormat::Csv => print_csv(&record.results),
    }
}

/// Print a bare results table (no session metadata).
pub fn print_table(table: &ResultsTable, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::print_table(table),
        OutputFormat::Json => print_json(&table.deduplicated()),
        OutputFormat::Csv => print_csv(table),
    }
}
