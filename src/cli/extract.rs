//! Extract subcommand implementation.
//!
//! Runs OCR and address extraction on PDFs that are already on disk, without
//! a browser. Useful for re-processing downloads or checking the prompt.

use crate::cli::OutputFormat;
use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::extract::{AddressExtractor, LlmClient, OcrEngine, OpenAiClient, TesseractCli};
use crate::output;
use crate::results::{ResultRow, ResultsTable};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Extract mailing addresses from local PDF files.
#[derive(Parser, Debug)]
pub struct ExtractCommand {
    /// PDF files to process
    #[arg(value_name = "PDF", required = true)]
    pub files: Vec<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Also write the deduplicated results as CSV
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

impl ExtractCommand {
    /// Execute the extract command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        if let Some(missing) = self.files.iter().find(|f| !f.is_file()) {
            return Err(CliError::Other(format!(
                "not a file: {}",
                missing.display()
            )));
        }

        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let llm = OpenAiClient::new(api_key, &settings.openai_model)?
            .with_base_url(&settings.openai_base_url);
        let ocr = TesseractCli::new(&settings.ocr_language, settings.ocr_dpi);
        let extractor = AddressExtractor::new(ocr, llm);

        let interactive = !quiet && self.output == OutputFormat::Plain;
        let table = extract_all(&extractor, &self.files, |row| {
            if interactive {
                output::print_row(row);
            }
        })
        .await;

        if let Some(path) = &self.csv {
            fs::write(path, table.to_csv()?)?;
            if !quiet {
                output::print_success(&format!("Results written to {}", path.display()));
            }
        }

        output::print_table(&table, self.output)?;
        Ok(())
    }
}

/// Process `files` in order, reporting each appended row.
async fn extract_all<O, L>(
    extractor: &AddressExtractor<O, L>,
    files: &[PathBuf],
    mut on_row: impl FnMut(&ResultRow),
) -> ResultsTable
where
    O: OcrEngine,
    L: LlmClient,
{
    let mut table = ResultsTable::new();

    for file in files {
        let extraction = extractor.extract(file).await;
        let rows = ResultRow::from_extraction(&display_name(file), extraction);
        if rows.is_empty() {
            tracing::warn!(file = %file.display(), "model returned no address");
        }
        for row in rows {
            on_row(&row);
            table.push(row);
        }
    }

    table
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
