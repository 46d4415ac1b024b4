//! CSV output formatting.

use crate::results::ResultsTable;
use std::io;

/// Print the deduplicated results as `Filename,Extracted Address` CSV.
pub fn print_csv(table: &ResultsTable) -> io::Result<()> {
    let stdout = io::stdout();
    table.write_csv(stdout.lock())?;
    Ok(())
}
