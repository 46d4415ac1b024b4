//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and data, and the
//! JSON settings file that tunes the portal, browser, OCR and LLM stages.

use crate::error::{ConfigError, ConfigResult};
use crate::extract::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global paths singleton.
static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/landrec)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/landrec)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance, creating the directories on first use.
    pub fn get() -> ConfigResult<&'static Paths> {
        if let Some(paths) = PATHS.get() {
            return Ok(paths);
        }
        let paths = Self::new()?;
        Ok(PATHS.get_or_init(|| paths))
    }

    fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "landrec", "landrec")
            .ok_or(ConfigError::DirectoryNotFound)?;

        let paths = Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_dir().to_path_buf(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the path to the profiles directory.
    pub fn profiles_dir(&self) -> PathBuf {
        self.config_dir.join("profiles")
    }

    /// Get the path to the session archive directory.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Root of the records portal single-page app (without the `#/...` route).
    pub portal_base_url: String,
    /// URL of a running chromedriver (or compatible) server.
    pub webdriver_url: String,
    /// Directory the browser downloads into. Defaults to the user's download dir.
    pub download_dir: Option<PathBuf>,
    /// Run the browser without a window.
    pub headless: bool,
    /// Timeout for each element wait, in seconds.
    pub element_timeout_secs: u64,
    /// Timeout for a document download to appear, in seconds.
    pub download_timeout_secs: u64,
    /// Chat model used for address extraction.
    pub openai_model: String,
    /// Base URL of the chat completions API.
    pub openai_base_url: String,
    /// Tesseract language code(s), e.g. "eng" or "eng+spa".
    pub ocr_language: String,
    /// Resolution PDF pages are rendered at before OCR.
    pub ocr_dpi: u32,
    /// Archive finished sessions automatically.
    pub auto_save_sessions: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            portal_base_url: "https://risweb.vacourts.gov/jsra/sra".to_string(),
            webdriver_url: "http://localhost:9515".to_string(),
            download_dir: None,
            headless: true,
            element_timeout_secs: 20,
            download_timeout_secs: 30,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            ocr_language: "eng".to_string(),
            ocr_dpi: 200,
            auto_save_sessions: true,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::get()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// The download directory to watch, resolving the platform default.
    pub fn resolved_download_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.download_dir {
            return Ok(dir.clone());
        }

        if let Some(dir) = UserDirs::new().and_then(|u| u.download_dir().map(Path::to_path_buf)) {
            return Ok(dir);
        }

        Ok(Paths::get()?.data_dir.join("downloads"))
    }
}
