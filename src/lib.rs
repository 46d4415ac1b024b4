//! # landrec - Land-Record Address Harvester
//!
//! landrec drives a court records portal through a WebDriver browser
//! session, downloads every document a saved search returns, reads each
//! scanned PDF with OCR and asks a language model for the property's
//! mailing address.
//!
//! ## Features
//!
//! - **Portal Automation**: Login, search form and per-row PDF download over
//!   the W3C WebDriver protocol
//! - **Address Extraction**: Poppler + Tesseract OCR, one chat completion per
//!   document
//! - **Search Profiles**: Save and reuse locality, category, look-back window
//!   and instrument types
//! - **Session History**: Finished sessions are archived and can be exported
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use landrec::extract::{AddressExtractor, OpenAiClient, TesseractCli};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let llm = OpenAiClient::new(std::env::var("OPENAI_API_KEY")?, "gpt-4")?;
//!     let extractor = AddressExtractor::new(TesseractCli::default(), llm);
//!
//!     let outcome = extractor.extract(Path::new("deed.pdf")).await;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`webdriver`] - Minimal W3C WebDriver client
//! - [`portal`] - The `RecordPortal` trait and the live portal session
//! - [`download`] - Download directory watcher
//! - [`extract`] - OCR, prompt, model call and reply parsing
//! - [`harvest`] - The row loop tying the pieces together
//! - [`results`] - Append-only results table with deduplicated views
//! - [`config`] - Settings and search profiles
//! - [`storage`] - Session archive
//! - [`error`] - Error types
//! - [`output`] - Output formatting utilities

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod output;
pub mod portal;
pub mod results;
pub mod storage;
pub mod types;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod test_server;

// Re-export commonly used types
pub use error::{CliError, PortalError, WebDriverError};
pub use harvest::{HarvestSummary, Harvester};
pub use portal::RecordPortal;
pub use results::{ResultRow, ResultsTable};
pub use types::{SearchWindow, SessionId};
