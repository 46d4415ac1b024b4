//! Address extraction pipeline: OCR, prompt, model call, reply parsing.
//!
//! [`AddressExtractor::extract`] never fails. OCR and model failures become
//! an [`Extraction::Failed`] value so the operator sees them in the results
//! table instead of losing the document silently.

mod llm;
mod ocr;
pub mod parse;
pub mod prompt;

pub use llm::{LlmClient, OpenAiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use ocr::{assemble_pages, OcrEngine, TesseractCli};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ocr,
    Llm,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ocr => write!(f, "OCR"),
            Self::Llm => write!(f, "LLM"),
        }
    }
}

/// Outcome of extracting addresses from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Addresses returned by the model (usually exactly one).
    Addresses(Vec<String>),
    /// OCR produced only whitespace.
    NoText,
    /// A stage failed; `reason` is the error message.
    Failed { stage: Stage, reason: String },
}

/// OCR followed by a single model call.
pub struct AddressExtractor<O, L> {
    ocr: O,
    llm: L,
}

impl<O: OcrEngine, L: LlmClient> AddressExtractor<O, L> {
    pub fn new(ocr: O, llm: L) -> Self {
        Self { ocr, llm }
    }

    /// Extract the mailing address from a downloaded PDF.
    pub async fn extract(&self, pdf: &Path) -> Extraction {
        let text = match self.ocr.pdf_text(pdf).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %pdf.display(), error = %e, "OCR failed");
                return Extraction::Failed {
                    stage: Stage::Ocr,
                    reason: e.to_string(),
                };
            }
        };

        if text.trim().is_empty() {
            tracing::warn!(file = %pdf.display(), "no text detected in PDF");
            return Extraction::NoText;
        }

        self.addresses_from_text(&text).await
    }

    /// Ask the model for the address in already-recognized text.
    pub async fn addresses_from_text(&self, text: &str) -> Extraction {
        let prompt = prompt::address_prompt(text);

        let result = match self.llm.complete(&prompt).await {
            Ok(reply) => parse::parse_address_list(&reply),
            Err(e) => Err(e),
        };

        match result {
            Ok(addresses) => {
                tracing::info!(count = addresses.len(), "addresses extracted");
                Extraction::Addresses(addresses)
            }
            Err(e) => {
                tracing::warn!(error = %e, "address extraction failed");
                Extraction::Failed {
                    stage: Stage::Llm,
                    reason: e.to_string(),
                }
            }
        }
    }
}
