//! Download directory watcher.
//!
//! The browser gives no signal when a download finishes, so the directory is
//! polled for a PDF that was not there before the download was triggered.
//! Chrome writes to `*.crdownload` and renames on completion, so only
//! finished files match.

use crate::error::DownloadError;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default time allowed for a download to appear.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Set of PDF paths present in the directory at one moment.
pub type Snapshot = BTreeSet<PathBuf>;

/// Watches one directory for newly downloaded PDFs.
#[derive(Debug, Clone)]
pub struct DownloadWatcher {
    dir: PathBuf,
    timeout: Duration,
    interval: Duration,
}

impl DownloadWatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// PDFs currently in the directory. A missing directory is empty.
    pub fn snapshot(&self) -> Result<Snapshot, DownloadError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::new()),
            Err(e) => return Err(e.into()),
        };

        let mut pdfs = Snapshot::new();
        for entry in entries {
            let path = entry?.path();
            if is_pdf(&path) && path.is_file() {
                pdfs.insert(path);
            }
        }
        Ok(pdfs)
    }

    /// Wait for a PDF that is not in `before`.
    ///
    /// When several new files appear in the same poll, the first in path
    /// order is returned.
    pub async fn wait_for_new(&self, before: &Snapshot) -> Result<PathBuf, DownloadError> {
        tracing::debug!(dir = %self.dir.display(), "waiting for PDF download");
        let deadline = Instant::now() + self.timeout;

        loop {
            let current = self.snapshot()?;
            if let Some(path) = current.difference(before).next() {
                tracing::info!(file = %path.display(), "new PDF downloaded");
                return Ok(path.clone());
            }

            if Instant::now() >= deadline {
                return Err(DownloadError::Timeout {
                    dir: self.dir.clone(),
                    timeout: self.timeout,
                });
            }

            sleep(self.interval).await;
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
