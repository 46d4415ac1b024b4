//! The row loop.
//!
//! Logs in, runs the search, then walks the result list one row at a time:
//! download the document, extract its address, append to the results table,
//! go back to the list. Rows are processed strictly in sequence because the
//! portal only has one viewer.

use crate::config::SearchProfile;
use crate::download::DownloadWatcher;
use crate::error::{PortalResult, RowError};
use crate::extract::{AddressExtractor, Extraction, LlmClient, OcrEngine};
use crate::portal::RecordPortal;
use crate::results::{ResultRow, ResultsTable};
use crate::types::SearchWindow;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters and results of one harvest session.
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    /// Rows in the result list, as last observed.
    pub rows_seen: usize,
    /// Rows whose document was downloaded and read.
    pub rows_processed: usize,
    /// Rows skipped because a download or extraction step failed.
    pub rows_failed: usize,
    /// The stop flag ended the loop before the list was exhausted.
    pub stopped_early: bool,
    pub duration: Duration,
    pub results: ResultsTable,
}

/// Drives a [`RecordPortal`] through one search and extracts every row.
pub struct Harvester<P, O, L> {
    portal: P,
    watcher: DownloadWatcher,
    extractor: AddressExtractor<O, L>,
    stop: Arc<AtomicBool>,
    progress: ProgressBar,
}

impl<P, O, L> Harvester<P, O, L>
where
    P: RecordPortal,
    O: OcrEngine,
    L: LlmClient,
{
    pub fn new(portal: P, watcher: DownloadWatcher, extractor: AddressExtractor<O, L>) -> Self {
        Self {
            portal,
            watcher,
            extractor,
            stop: Arc::new(AtomicBool::new(false)),
            progress: ProgressBar::hidden(),
        }
    }

    /// Show a spinner with the current row on stderr.
    pub fn with_progress(mut self) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] row {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        self.progress = pb;
        self
    }

    /// Flag that ends the loop after the current row.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    /// Run the whole session. `on_row` sees each row as it is appended.
    ///
    /// Login and search failures end the session with an error. The portal
    /// is closed on every path.
    pub async fn run<F>(
        &mut self,
        profile: &SearchProfile,
        window: SearchWindow,
        mut on_row: F,
    ) -> PortalResult<HarvestSummary>
    where
        F: FnMut(&ResultRow),
    {
        let started = Instant::now();
        let outcome = self.harvest(profile, window, &mut on_row).await;

        if let Err(e) = self.portal.close().await {
            tracing::warn!(error = %e, "failed to close browser session");
        }
        self.progress.finish_and_clear();

        let mut summary = outcome?;
        summary.duration = started.elapsed();
        tracing::info!(
            rows = summary.rows_seen,
            processed = summary.rows_processed,
            failed = summary.rows_failed,
            stopped_early = summary.stopped_early,
            "harvest finished"
        );
        Ok(summary)
    }

    async fn harvest(
        &mut self,
        profile: &SearchProfile,
        window: SearchWindow,
        on_row: &mut dyn FnMut(&ResultRow),
    ) -> PortalResult<HarvestSummary> {
        self.progress.set_message("logging in");
        self.portal.login().await?;

        self.progress.set_message("searching");
        tracing::info!(profile = %profile.name, window = %window, "running search");
        self.portal.search(profile, window).await?;

        let mut summary = HarvestSummary::default();
        let mut index = 0;

        loop {
            // The list is re-rendered after every go-back, so re-read it.
            let count = match self.portal.row_count().await {
                Ok(count) => count,
                Err(e) => {
                    tracing::error!(error = %e, "could not read result rows");
                    summary.stopped_early = self.stop.load(Ordering::SeqCst);
                    break;
                }
            };
            summary.rows_seen = count;
            self.progress.set_length(count as u64);

            if index >= count {
                break;
            }

            // Checked after the count so a stop before the first row still
            // leaves the remaining rows on record.
            if self.stop.load(Ordering::SeqCst) {
                summary.stopped_early = true;
                tracing::warn!(
                    row = index + 1,
                    remaining = count - index,
                    "stop requested, ending session"
                );
                break;
            }

            self.progress.set_position(index as u64 + 1);
            self.progress.set_message("downloading");
            tracing::info!(row = index + 1, total = count, "processing row");

            match self.process_row(index).await {
                Ok((filename, extraction)) => {
                    if matches!(extraction, Extraction::Failed { .. }) {
                        summary.rows_failed += 1;
                    } else {
                        summary.rows_processed += 1;
                    }
                    let rows = ResultRow::from_extraction(&filename, extraction);
                    if rows.is_empty() {
                        tracing::warn!(file = %filename, "model returned no address");
                    }
                    for row in rows {
                        self.progress.suspend(|| on_row(&row));
                        summary.results.push(row);
                    }
                }
                Err(e) => {
                    tracing::warn!(row = index + 1, error = %e, "skipping row");
                    summary.rows_failed += 1;
                }
            }

            if let Err(e) = self.portal.go_back().await {
                tracing::warn!(row = index + 1, error = %e, "failed to return to result list");
            }

            index += 1;
        }

        Ok(summary)
    }

    /// Download one row's PDF and extract it.
    async fn process_row(&mut self, index: usize) -> Result<(String, Extraction), RowError> {
        let before = self.watcher.snapshot()?;
        self.portal.download_row(index).await?;
        let pdf = self.watcher.wait_for_new(&before).await?;

        self.progress.set_message("extracting");
        let extraction = self.extractor.extract(&pdf).await;
        Ok((file_name(&pdf), extraction))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PortalError, WebDriverError};
    use crate::extract::testing::{MockLlm, MockOcr};
    use crate::results::RowOutcome;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// In-memory portal that "downloads" by writing files into a directory.
    struct MockPortal {
        dir: PathBuf,
        /// File written for each row; `None` makes the download fail.
        rows: Vec<Option<&'static str>>,
        fail_login: bool,
        calls: Vec<String>,
    }

    impl MockPortal {
        fn new(dir: &Path, rows: Vec<Option<&'static str>>) -> Self {
            Self {
                dir: dir.to_path_buf(),
                rows,
                fail_login: false,
                calls: Vec::new(),
            }
        }

        fn count(&self, call: &str) -> usize {
            self.calls.iter().filter(|c| c.as_str() == call).count()
        }
    }

    #[async_trait]
    impl RecordPortal for MockPortal {
        async fn login(&mut self) -> PortalResult<()> {
            self.calls.push("login".into());
            if self.fail_login {
                return Err(PortalError::Login(WebDriverError::Protocol(
                    "bad credentials".into(),
                )));
            }
            Ok(())
        }

        async fn search(&mut self, _: &SearchProfile, _: SearchWindow) -> PortalResult<()> {
            self.calls.push("search".into());
            Ok(())
        }

        async fn row_count(&mut self) -> PortalResult<usize> {
            Ok(self.rows.len())
        }

        async fn download_row(&mut self, index: usize) -> PortalResult<()> {
            self.calls.push(format!("download {}", index));
            match self.rows.get(index) {
                Some(Some(file)) => {
                    std::fs::write(self.dir.join(file), b"%PDF-1.4").map_err(|e| {
                        PortalError::Driver(WebDriverError::Protocol(e.to_string()))
                    })?;
                    Ok(())
                }
                Some(None) => Err(PortalError::Driver(WebDriverError::Command {
                    error: "element click intercepted".into(),
                    message: "viewer did not open".into(),
                })),
                None => Err(PortalError::RowOutOfRange(index)),
            }
        }

        async fn go_back(&mut self) -> PortalResult<()> {
            self.calls.push("back".into());
            Ok(())
        }

        async fn close(&mut self) -> PortalResult<()> {
            self.calls.push("close".into());
            Ok(())
        }
    }

    fn harvester(
        dir: &TempDir,
        portal: MockPortal,
        ocr: MockOcr,
        llm: MockLlm,
    ) -> Harvester<MockPortal, MockOcr, MockLlm> {
        let watcher = DownloadWatcher::new(dir.path())
            .with_timeout(Duration::from_millis(200))
            .with_interval(Duration::from_millis(10));
        Harvester::new(portal, watcher, AddressExtractor::new(ocr, llm))
    }

    fn window() -> SearchWindow {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        SearchWindow::lookback(today, 90)
    }

    #[tokio::test]
    async fn test_processes_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let portal = MockPortal::new(dir.path(), vec![Some("one.pdf"), Some("two.pdf")]);
        let ocr = MockOcr::default()
            .with_text("one.pdf", "deed text one")
            .with_text("two.pdf", "deed text two");
        let llm = MockLlm::replying(&[Ok("['1 Main St']"), Ok("['1 Main St']")]);
        let mut harvester = harvester(&dir, portal, ocr, llm);

        let mut seen = Vec::new();
        let summary = harvester
            .run(&SearchProfile::norfolk_deeds(), window(), |row| {
                seen.push(row.filename.clone())
            })
            .await
            .unwrap();

        assert_eq!(seen, vec!["one.pdf", "two.pdf"]);
        assert_eq!(summary.rows_seen, 2);
        assert_eq!(summary.rows_processed, 2);
        assert_eq!(summary.rows_failed, 0);
        assert!(!summary.stopped_early);
        assert_eq!(summary.results.len(), 2);

        let portal = harvester.portal();
        assert_eq!(portal.count("back"), 2);
        assert_eq!(portal.count("close"), 1);
    }

    #[tokio::test]
    async fn test_failed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let portal = MockPortal::new(
            dir.path(),
            vec![None, Some("bad.pdf"), Some("good.pdf")],
        );
        let ocr = MockOcr::default()
            .with_failure("bad.pdf", "image too small")
            .with_text("good.pdf", "grantee address");
        let llm = MockLlm::replying(&[Ok("[\"9 Bay Ave, Norfolk, VA\"]")]);
        let mut harvester = harvester(&dir, portal, ocr, llm);

        let summary = harvester
            .run(&SearchProfile::norfolk_deeds(), window(), |_| {})
            .await
            .unwrap();

        assert_eq!(summary.rows_processed, 1);
        assert_eq!(summary.rows_failed, 2);
        let rows = summary.results.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].outcome, RowOutcome::OcrFailed);
        assert!(rows[0].address.starts_with("OCR failed: "));
        assert_eq!(rows[1].address, "9 Bay Ave, Norfolk, VA");

        // go_back is attempted after the failed download too.
        assert_eq!(harvester.portal().count("back"), 3);
    }

    #[tokio::test]
    async fn test_login_failure_aborts_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let mut portal = MockPortal::new(dir.path(), vec![Some("one.pdf")]);
        portal.fail_login = true;
        let mut harvester = harvester(&dir, portal, MockOcr::default(), MockLlm::default());

        let result = harvester
            .run(&SearchProfile::norfolk_deeds(), window(), |_| {})
            .await;

        assert!(matches!(result, Err(PortalError::Login(_))));
        let portal = harvester.portal();
        assert_eq!(portal.count("search"), 0);
        assert_eq!(portal.count("close"), 1);
    }

    #[tokio::test]
    async fn test_stop_flag_finishes_current_row() {
        let dir = tempfile::tempdir().unwrap();
        let portal = MockPortal::new(
            dir.path(),
            vec![Some("a.pdf"), Some("b.pdf"), Some("c.pdf")],
        );
        let ocr = MockOcr::default()
            .with_text("a.pdf", "text")
            .with_text("b.pdf", "text")
            .with_text("c.pdf", "text");
        let llm = MockLlm::replying(&[Ok("['1 A St']"), Ok("['2 B St']"), Ok("['3 C St']")]);
        let mut harvester = harvester(&dir, portal, ocr, llm);

        let stop = harvester.stop_handle();
        let summary = harvester
            .run(&SearchProfile::norfolk_deeds(), window(), move |_| {
                stop.store(true, Ordering::SeqCst)
            })
            .await
            .unwrap();

        assert!(summary.stopped_early);
        assert_eq!(summary.results.len(), 1);
        assert_eq!(harvester.portal().count("download 0"), 1);
        assert_eq!(harvester.portal().count("download 1"), 0);
    }

    #[tokio::test]
    async fn test_stop_before_first_row_is_stopped_early() {
        let dir = tempfile::tempdir().unwrap();
        let portal = MockPortal::new(dir.path(), vec![Some("a.pdf"), Some("b.pdf")]);
        let mut harvester = harvester(&dir, portal, MockOcr::default(), MockLlm::default());
        harvester.stop_handle().store(true, Ordering::SeqCst);

        let summary = harvester
            .run(&SearchProfile::norfolk_deeds(), window(), |_| {})
            .await
            .unwrap();

        assert!(summary.stopped_early);
        assert_eq!(summary.rows_seen, 2);
        assert_eq!(summary.rows_processed, 0);
        assert!(summary.results.is_empty());

        let portal = harvester.portal();
        assert_eq!(portal.count("download 0"), 0);
        assert_eq!(portal.count("close"), 1);
    }

    #[tokio::test]
    async fn test_stop_after_last_row_is_not_stopped_early() {
        let dir = tempfile::tempdir().unwrap();
        let portal = MockPortal::new(dir.path(), vec![Some("only.pdf")]);
        let ocr = MockOcr::default().with_text("only.pdf", "text");
        let llm = MockLlm::replying(&[Ok("['4 D St']")]);
        let mut harvester = harvester(&dir, portal, ocr, llm);

        let stop = harvester.stop_handle();
        let summary = harvester
            .run(&SearchProfile::norfolk_deeds(), window(), move |_| {
                stop.store(true, Ordering::SeqCst)
            })
            .await
            .unwrap();

        assert!(!summary.stopped_early);
        assert_eq!(summary.rows_processed, 1);
    }

    #[tokio::test]
    async fn test_empty_address_list_appends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let portal = MockPortal::new(dir.path(), vec![Some("x.pdf")]);
        let ocr = MockOcr::default().with_text("x.pdf", "illegible");
        let llm = MockLlm::replying(&[Ok("[]")]);
        let mut harvester = harvester(&dir, portal, ocr, llm);

        let summary = harvester
            .run(&SearchProfile::norfolk_deeds(), window(), |_| {})
            .await
            .unwrap();

        assert_eq!(summary.rows_processed, 1);
        assert!(summary.results.is_empty());
    }
}
