//! JSON-based session storage.
//!
//! Stores each session as a separate JSON file named by its ID. Supports
//! listing, prefix lookup, deletion and age-based cleanup.

use crate::config::{Paths, SearchProfile};
use crate::error::{StorageError, StorageResult};
use crate::harvest::HarvestSummary;
use crate::results::ResultsTable;
use crate::types::{SearchWindow, SessionId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A persisted harvest session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier for this session.
    pub id: SessionId,
    /// When the session was started.
    pub started_at: DateTime<Utc>,
    /// When the session ended.
    pub completed_at: DateTime<Utc>,
    /// Name of the search profile used.
    pub profile: String,
    /// Portal locality that was searched.
    pub locality: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub rows_seen: usize,
    pub rows_processed: usize,
    pub rows_failed: usize,
    /// The operator stopped the session before the list was exhausted.
    pub stopped_early: bool,
    /// Total session duration in milliseconds.
    pub duration_ms: u64,
    /// Every appended row, duplicates included.
    pub results: ResultsTable,
}

impl SessionRecord {
    /// Start a record for a session about to run.
    pub fn new(profile: &SearchProfile, window: SearchWindow) -> Self {
        Self {
            id: SessionId::new(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            profile: profile.name.clone(),
            locality: profile.locality.clone(),
            from_date: window.from,
            to_date: window.to,
            rows_seen: 0,
            rows_processed: 0,
            rows_failed: 0,
            stopped_early: false,
            duration_ms: 0,
            results: ResultsTable::new(),
        }
    }

    /// Fill in the outcome of the session.
    pub fn finalize(mut self, summary: HarvestSummary) -> Self {
        self.completed_at = Utc::now();
        self.duration_ms = summary.duration.as_millis() as u64;
        self.rows_seen = summary.rows_seen;
        self.rows_processed = summary.rows_processed;
        self.rows_failed = summary.rows_failed;
        self.stopped_early = summary.stopped_early;
        self.results = summary.results;
        self
    }

    pub fn window(&self) -> SearchWindow {
        SearchWindow {
            from: self.from_date,
            to: self.to_date,
        }
    }

    /// Get a short summary of the session.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) - {} rows, {} addresses, {} failed [{:.2}s]",
            self.profile,
            self.window(),
            self.rows_seen,
            self.results.extracted_count(),
            self.rows_failed,
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// JSON file-based session storage.
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    /// Open the store in the default data directory.
    pub fn new() -> StorageResult<Self> {
        let paths = Paths::get()?;
        Self::with_dir(paths.sessions_dir())
    }

    /// Open a store rooted at `sessions_dir`, creating it if needed.
    pub fn with_dir(sessions_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let sessions_dir = sessions_dir.into();
        fs::create_dir_all(&sessions_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?;

        Ok(Self { sessions_dir })
    }

    /// Save a session record.
    pub fn save(&self, record: &SessionRecord) -> StorageResult<()> {
        let file = self.session_file(&record.id);
        let content = serde_json::to_string_pretty(record)?;

        fs::write(&file, content).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Load a session record by ID.
    pub fn load(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        let file = self.session_file(id);

        if !file.exists() {
            return Err(StorageError::SessionNotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| StorageError::LoadFailed(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed(e.to_string()))
    }

    /// Find a session by ID prefix (e.g. the 8-character short form).
    pub fn find_by_prefix(&self, prefix: &str) -> StorageResult<SessionRecord> {
        let matches: Vec<_> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.to_string().starts_with(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(StorageError::SessionNotFound(prefix.to_string())),
            [id] => self.load(id),
            _ => Err(StorageError::AmbiguousPrefix(
                prefix.to_string(),
                matches.len(),
            )),
        }
    }

    /// List all session IDs.
    pub fn list_ids(&self) -> StorageResult<Vec<SessionId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.sessions_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?
        {
            let entry = entry.map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    if let Ok(id) = stem.to_string_lossy().parse::<SessionId>() {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// List all session records, most recent first.
    pub fn list(&self) -> StorageResult<Vec<SessionRecord>> {
        let mut records = Vec::new();

        for id in self.list_ids()? {
            match self.load(&id) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(session = %id, error = %e, "skipping unreadable session"),
            }
        }

        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(records)
    }

    /// List the `count` most recent sessions.
    pub fn list_recent(&self, count: usize) -> StorageResult<Vec<SessionRecord>> {
        let mut records = self.list()?;
        records.truncate(count);
        Ok(records)
    }

    /// Delete a session record.
    pub fn delete(&self, id: &SessionId) -> StorageResult<()> {
        let file = self.session_file(id);

        if !file.exists() {
            return Err(StorageError::SessionNotFound(id.to_string()));
        }

        fs::remove_file(&file).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Delete sessions older than `max_age`. Returns how many were removed.
    pub fn cleanup(&self, max_age: chrono::Duration) -> StorageResult<usize> {
        let cutoff = Utc::now() - max_age;
        let mut deleted = 0;

        for record in self.list()? {
            if record.started_at < cutoff {
                self.delete(&record.id)?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    fn session_file(&self, id: &SessionId) -> PathBuf {
        self.sessions_dir.join(format!("{}.json", id))
    }
}
