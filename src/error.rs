//! Error types for landrec.
//!
//! Uses `thiserror` for ergonomic error definitions. Each concern gets its
//! own enum; `CliError` is the umbrella the subcommands return.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the WebDriver server.
#[derive(Error, Debug)]
pub enum WebDriverError {
    #[error("HTTP error talking to WebDriver: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver command failed ({error}): {message}")]
    Command { error: String, message: String },

    #[error("unexpected WebDriver response: {0}")]
    Protocol(String),

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),
}

impl WebDriverError {
    /// True when the server reported that the element could not be located.
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, Self::Command { error, .. } if error == "no such element")
    }
}

/// Errors raised by the records portal automation.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("login failed: {0}")]
    Login(#[source] WebDriverError),

    #[error("search form failed at '{step}': {source}")]
    Search {
        step: &'static str,
        #[source]
        source: WebDriverError,
    },

    #[error("row {0} is out of range")]
    RowOutOfRange(usize),

    #[error(transparent)]
    Driver(#[from] WebDriverError),
}

/// Errors raised while waiting for a downloaded document.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("no PDF appeared in {dir} within {timeout:?}")]
    Timeout { dir: PathBuf, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single result row. The harvest loop logs it and moves on.
#[derive(Error, Debug)]
pub enum RowError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Errors raised by the OCR and address-extraction pipeline.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("required tool '{0}' is not installed or not on PATH")]
    ToolMissing(&'static str),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("PDF rendered no pages: {0}")]
    NoPages(PathBuf),

    #[error("LLM request failed: {0}")]
    LlmHttp(#[from] reqwest::Error),

    #[error("LLM returned status {status}: {body}")]
    LlmStatus { status: u16, body: String },

    #[error("LLM response had no content")]
    EmptyReply,

    #[error("could not parse LLM reply as a list of strings: {0}")]
    UnparsableReply(String),

    #[error("missing API key (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration management.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directories")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to search profiles.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("profile already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid profile: {0}")]
    Invalid(String),

    #[error("failed to save profile: {0}")]
    SaveFailed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to the session archive.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("ambiguous session prefix '{0}': {1} matches")]
    AmbiguousPrefix(String, usize),

    #[error("storage directory error: {0}")]
    DirectoryError(String),

    #[error("failed to save session: {0}")]
    SaveFailed(String),

    #[error("failed to load session: {0}")]
    LoadFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Top-level error returned by CLI subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    WebDriver(#[from] WebDriverError),

    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    SessionId(#[from] crate::types::SessionIdError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type WebDriverResult<T> = Result<T, WebDriverError>;
pub type PortalResult<T> = Result<T, PortalError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ProfileResult<T> = Result<T, ProfileError>;
pub type StorageResult<T> = Result<T, StorageError>;
pub type CliResult<T> = Result<T, CliError>;
