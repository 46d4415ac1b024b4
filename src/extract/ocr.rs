//! PDF text recognition through Poppler and Tesseract.
//!
//! Pages are rasterized with `pdftoppm` into a scratch directory, then each
//! page image is read with the `tesseract` command-line tool.

use crate::error::ExtractError;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Turns a scanned PDF into plain text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognized text of every page, assembled with [`assemble_pages`].
    async fn pdf_text(&self, pdf: &Path) -> Result<String, ExtractError>;
}

/// OCR engine backed by the `pdftoppm` and `tesseract` binaries.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    language: String,
    dpi: u32,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: 200,
        }
    }
}

impl TesseractCli {
    pub fn new(language: impl Into<String>, dpi: u32) -> Self {
        Self {
            language: language.into(),
            dpi,
        }
    }

    /// Render every page of `pdf` to PNG files in `out_dir`, in page order.
    async fn render_pages(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let prefix = out_dir.join("page");
        let output = run(
            "pdftoppm",
            Command::new("pdftoppm")
                .arg("-r")
                .arg(self.dpi.to_string())
                .arg("-png")
                .arg(pdf)
                .arg(&prefix),
        )
        .await?;
        check_status("pdftoppm", &output)?;

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        if pages.is_empty() {
            return Err(ExtractError::NoPages(pdf.to_path_buf()));
        }

        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    async fn recognize(&self, image: &Path) -> Result<String, ExtractError> {
        let output = run(
            "tesseract",
            Command::new("tesseract")
                .arg(image)
                .arg("stdout")
                .arg("-l")
                .arg(&self.language),
        )
        .await?;
        check_status("tesseract", &output)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn pdf_text(&self, pdf: &Path) -> Result<String, ExtractError> {
        tracing::info!(file = %pdf.display(), "starting OCR");

        let scratch = tempfile::tempdir()?;
        let pages = self.render_pages(pdf, scratch.path()).await?;

        let mut texts = Vec::with_capacity(pages.len());
        for page in &pages {
            texts.push(self.recognize(page).await?);
        }

        tracing::info!(file = %pdf.display(), pages = pages.len(), "OCR completed");
        Ok(assemble_pages(&texts))
    }
}

/// Join per-page text with `--- Page N ---` headers (1-based).
pub fn assemble_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("--- Page {} ---\n{}\n\n", i + 1, text.as_ref().trim()))
        .collect()
}

/// Page number of a `pdftoppm` output file (`page-7.png`, `page-07.png`).
fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit_once('-')?.1.parse().ok()
}

async fn run(tool: &'static str, command: &mut Command) -> Result<Output, ExtractError> {
    command.kill_on_drop(true).output().await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ExtractError::ToolMissing(tool)
        } else {
            ExtractError::Io(e)
        }
    })
}

fn check_status(tool: &'static str, output: &Output) -> Result<(), ExtractError> {
    if output.status.success() {
        return Ok(());
    }
    Err(ExtractError::ToolFailed {
        tool,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_pages() {
        let text = assemble_pages(&["  DEED OF GIFT \n", "", "Page three"]);
        assert_eq!(
            text,
            "--- Page 1 ---\nDEED OF GIFT\n\n--- Page 2 ---\n\n\n--- Page 3 ---\nPage three\n\n"
        );
        assert_eq!(assemble_pages::<&str>(&[]), "");
    }

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_number(Path::new("/tmp/x/page-1.ppm")), None);
        assert_eq!(page_number(Path::new("/tmp/x/page.png")), None);
    }

    #[test]
    fn test_page_order_is_numeric() {
        let mut names = vec!["page-10.png", "page-2.png", "page-1.png"];
        names.sort_by_key(|n| page_number(Path::new(n)));
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[tokio::test]
    async fn test_missing_pdf_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TesseractCli::default();
        let result = engine.pdf_text(&dir.path().join("absent.pdf")).await;
        // Either pdftoppm is installed and rejects the file, or it is missing.
        assert!(matches!(
            result,
            Err(ExtractError::ToolFailed { .. }) | Err(ExtractError::ToolMissing(_))
        ));
    }
}
