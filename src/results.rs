//! The append-only results table.
//!
//! Rows are appended as documents are processed and never removed. Display
//! and export go through [`ResultsTable::deduplicated`].

use crate::extract::{Extraction, Stage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Default file name for CSV exports.
pub const DEFAULT_CSV_NAME: &str = "extracted_addresses.csv";

/// CSV header row.
pub const CSV_HEADERS: [&str; 2] = ["Filename", "Extracted Address"];

/// How a row's address column was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Extracted,
    NoText,
    OcrFailed,
    LlmFailed,
}

impl RowOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted)
    }
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extracted => write!(f, "extracted"),
            Self::NoText => write!(f, "no text"),
            Self::OcrFailed => write!(f, "OCR failed"),
            Self::LlmFailed => write!(f, "LLM failed"),
        }
    }
}

/// One `(filename, address)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub filename: String,
    /// The extracted address, or a status message for failed rows.
    pub address: String,
    pub outcome: RowOutcome,
}

impl ResultRow {
    pub fn extracted(filename: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            address: address.into(),
            outcome: RowOutcome::Extracted,
        }
    }

    /// Rows produced by one extraction. An empty address list yields none.
    pub fn from_extraction(filename: &str, extraction: Extraction) -> Vec<ResultRow> {
        match extraction {
            Extraction::Addresses(addresses) => addresses
                .into_iter()
                .map(|address| Self::extracted(filename, address))
                .collect(),
            Extraction::NoText => vec![Self {
                filename: filename.to_string(),
                address: "No text detected".to_string(),
                outcome: RowOutcome::NoText,
            }],
            Extraction::Failed { stage, reason } => {
                let (outcome, label) = match stage {
                    Stage::Ocr => (RowOutcome::OcrFailed, "OCR failed"),
                    Stage::Llm => (RowOutcome::LlmFailed, "OpenAI error"),
                };
                vec![Self {
                    filename: filename.to_string(),
                    address: format!("{}: {}", label, reason),
                    outcome,
                }]
            }
        }
    }
}

/// Append-only list of result rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsTable {
    rows: Vec<ResultRow>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in append order, duplicates included.
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Unique `(filename, address)` pairs in first-seen order.
    pub fn deduplicated(&self) -> Vec<&ResultRow> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert((row.filename.as_str(), row.address.as_str())))
            .collect()
    }

    /// Number of deduplicated rows with an extracted address.
    pub fn extracted_count(&self) -> usize {
        self.deduplicated()
            .iter()
            .filter(|row| row.outcome.is_extracted())
            .count()
    }

    /// Write the deduplicated view as CSV.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADERS)?;
        for row in self.deduplicated() {
            wtr.write_record([row.filename.as_str(), row.address.as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// The deduplicated view as a CSV string.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl FromIterator<ResultRow> for ResultsTable {
    fn from_iter<I: IntoIterator<Item = ResultRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
