//! Search profile management.
//!
//! A profile captures everything the portal's search form needs: which
//! court, which record category, the name query, how far back to look and
//! which instrument types to include.

use crate::error::{ConfigError, ProfileError, ProfileResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::settings::Paths;

/// Instrument types searched when a profile does not list its own.
pub const DEFAULT_INSTRUMENT_TYPES: &[&str] = &[
    "AFFIDAVIT",
    "DEED TRANSFER ON DEATH",
    "DEED PURSUANT TO DIVORCE",
    "DIVORCE DECREE",
    "MECHANICS LIEN",
    "MEMORANDUM OF LIEN",
    "NOTICE OF LIEN",
    "NOTICE OF LIS PENDENS",
    "NOTICE",
    "ORDER-DECREE BANKRUPTCY W/PLAT",
    "REAL ESTATE AFFIDAVIT",
    "WILL",
];

/// Name of the profile used when none is given.
pub const DEFAULT_PROFILE: &str = "norfolk-deeds";

/// A saved search profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProfile {
    /// Profile name (used as identifier).
    pub name: String,
    /// Description of this profile.
    #[serde(default)]
    pub description: String,
    /// Court locality as shown in the portal's court table.
    pub locality: String,
    /// Record category as shown in the portal's category table.
    #[serde(default = "default_record_category")]
    pub record_category: String,
    /// Party name query typed into the search box.
    #[serde(default = "default_name_query")]
    pub name_query: String,
    /// Days before today the search window starts.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Instrument types selected in the multi-select.
    #[serde(default = "default_instrument_types")]
    pub instrument_types: Vec<String>,
}

fn default_record_category() -> String {
    "Deeds and Land Records".to_string()
}

fn default_name_query() -> String {
    "aa".to_string()
}

fn default_lookback_days() -> u32 {
    90
}

fn default_instrument_types() -> Vec<String> {
    DEFAULT_INSTRUMENT_TYPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl SearchProfile {
    /// Create a new profile for a locality with default search settings.
    pub fn new(name: impl Into<String>, locality: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            locality: locality.into(),
            record_category: default_record_category(),
            name_query: default_name_query(),
            lookback_days: default_lookback_days(),
            instrument_types: default_instrument_types(),
        }
    }

    /// Validate the profile configuration.
    pub fn validate(&self) -> ProfileResult<()> {
        if self.name.is_empty() {
            return Err(ProfileError::Invalid("name cannot be empty".to_string()));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ProfileError::Invalid(
                "name can only contain alphanumeric characters, hyphens, and underscores"
                    .to_string(),
            ));
        }

        if self.locality.trim().is_empty() {
            return Err(ProfileError::Invalid("locality cannot be empty".to_string()));
        }

        if self.lookback_days == 0 {
            return Err(ProfileError::Invalid(
                "lookback_days must be at least 1".to_string(),
            ));
        }

        if self.instrument_types.iter().all(|t| t.trim().is_empty()) {
            return Err(ProfileError::Invalid(
                "at least one instrument type is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Built-in profile for Norfolk City deed records.
    pub fn norfolk_deeds() -> Self {
        Self {
            description: "Norfolk City deeds and liens, last 90 days".to_string(),
            ..Self::new(DEFAULT_PROFILE, "Norfolk City")
        }
    }

    /// Get all built-in profiles.
    pub fn builtins() -> Vec<SearchProfile> {
        vec![Self::norfolk_deeds()]
    }

    fn is_builtin(name: &str) -> bool {
        Self::builtins().iter().any(|p| p.name == name)
    }
}

/// Manages profile storage and retrieval.
pub struct ProfileManager {
    profiles_dir: PathBuf,
    cache: BTreeMap<String, SearchProfile>,
}

impl ProfileManager {
    /// Create a profile manager over the default profiles directory.
    pub fn new() -> ProfileResult<Self> {
        let profiles_dir = Paths::get()?.profiles_dir();
        Self::with_dir(profiles_dir)
    }

    /// Create a profile manager over a specific directory.
    pub fn with_dir(profiles_dir: impl Into<PathBuf>) -> ProfileResult<Self> {
        let profiles_dir = profiles_dir.into();

        fs::create_dir_all(&profiles_dir).map_err(|e| {
            ProfileError::Config(ConfigError::WriteFailed {
                path: profiles_dir.clone(),
                reason: e.to_string(),
            })
        })?;

        let mut manager = Self {
            profiles_dir,
            cache: BTreeMap::new(),
        };
        manager.load_all()?;

        Ok(manager)
    }

    /// Get a profile by name.
    pub fn get(&self, name: &str) -> Option<&SearchProfile> {
        self.cache.get(name)
    }

    /// Get a profile by name, failing when it does not exist.
    pub fn require(&self, name: &str) -> ProfileResult<&SearchProfile> {
        self.get(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))
    }

    /// List all available profiles, sorted by name.
    pub fn list(&self) -> Vec<&SearchProfile> {
        self.cache.values().collect()
    }

    /// Create a new profile.
    pub fn create(&mut self, profile: SearchProfile) -> ProfileResult<()> {
        profile.validate()?;

        if self.cache.contains_key(&profile.name) {
            return Err(ProfileError::AlreadyExists(profile.name.clone()));
        }

        self.save_profile(&profile)?;
        self.cache.insert(profile.name.clone(), profile);

        Ok(())
    }

    /// Delete a user profile. Built-ins cannot be deleted.
    pub fn delete(&mut self, name: &str) -> ProfileResult<()> {
        if SearchProfile::is_builtin(name) {
            return Err(ProfileError::Invalid(
                "cannot delete built-in profile".to_string(),
            ));
        }

        if !self.cache.contains_key(name) {
            return Err(ProfileError::NotFound(name.to_string()));
        }

        let file = self.profile_file(name);
        if file.exists() {
            fs::remove_file(&file).map_err(|e| ProfileError::SaveFailed(e.to_string()))?;
        }

        self.cache.remove(name);

        Ok(())
    }

    /// Load built-ins, then user profiles (which override built-ins of the same name).
    fn load_all(&mut self) -> ProfileResult<()> {
        for profile in SearchProfile::builtins() {
            self.cache.insert(profile.name.clone(), profile);
        }

        let entries = fs::read_dir(&self.profiles_dir)
            .map_err(|e| ProfileError::SaveFailed(e.to_string()))?;

        for entry in entries {
            let path = entry
                .map_err(|e| ProfileError::SaveFailed(e.to_string()))?
                .path();

            if path.extension().is_some_and(|ext| ext == "json") {
                let parsed = fs::read_to_string(&path)
                    .ok()
                    .and_then(|content| serde_json::from_str::<SearchProfile>(&content).ok());

                match parsed {
                    Some(profile) => {
                        self.cache.insert(profile.name.clone(), profile);
                    }
                    None => tracing::warn!(path = %path.display(), "skipping unreadable profile"),
                }
            }
        }

        Ok(())
    }

    fn save_profile(&self, profile: &SearchProfile) -> ProfileResult<()> {
        let file = self.profile_file(&profile.name);
        let content = serde_json::to_string_pretty(profile)
            .map_err(|e| ProfileError::SaveFailed(e.to_string()))?;

        fs::write(&file, content).map_err(|e| ProfileError::SaveFailed(e.to_string()))
    }

    fn profile_file(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{}.json", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_profile_validation() {
        let mut profile = SearchProfile::new("test", "Richmond City");
        assert!(profile.validate().is_ok());

        profile.name = "".to_string();
        assert!(profile.validate().is_err());

        profile.name = "test!@#".to_string();
        assert!(profile.validate().is_err());

        profile.name = "test".to_string();
        profile.lookback_days = 0;
        assert!(profile.validate().is_err());

        profile.lookback_days = 30;
        profile.instrument_types.clear();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_builtin_profiles_are_valid() {
        for profile in SearchProfile::builtins() {
            assert!(profile.validate().is_ok());
        }
        let norfolk = SearchProfile::norfolk_deeds();
        assert_eq!(norfolk.locality, "Norfolk City");
        assert_eq!(norfolk.instrument_types.len(), 12);
    }

    #[test]
    fn test_minimal_profile_json_gets_defaults() {
        let profile: SearchProfile =
            serde_json::from_str(r#"{"name": "va-beach", "locality": "Virginia Beach City"}"#)
                .unwrap();
        assert_eq!(profile.record_category, "Deeds and Land Records");
        assert_eq!(profile.lookback_days, 90);
        assert_eq!(profile.instrument_types.len(), DEFAULT_INSTRUMENT_TYPES.len());
    }

    #[test]
    fn test_manager_create_reload_delete() {
        let dir = tempdir().unwrap();

        let mut manager = ProfileManager::with_dir(dir.path()).unwrap();
        assert!(manager.get(DEFAULT_PROFILE).is_some());

        let mut profile = SearchProfile::new("hampton", "Hampton City");
        profile.lookback_days = 30;
        manager.create(profile.clone()).unwrap();
        assert!(matches!(
            manager.create(profile.clone()),
            Err(ProfileError::AlreadyExists(_))
        ));

        let reloaded = ProfileManager::with_dir(dir.path()).unwrap();
        assert_eq!(reloaded.require("hampton").unwrap(), &profile);

        let mut manager = reloaded;
        manager.delete("hampton").unwrap();
        assert!(manager.get("hampton").is_none());
        assert!(!dir.path().join("hampton.json").exists());
    }

    #[test]
    fn test_builtin_cannot_be_deleted() {
        let dir = tempdir().unwrap();
        let mut manager = ProfileManager::with_dir(dir.path()).unwrap();
        assert!(matches!(
            manager.delete(DEFAULT_PROFILE),
            Err(ProfileError::Invalid(_))
        ));
        assert!(matches!(
            manager.delete("missing"),
            Err(ProfileError::NotFound(_))
        ));
    }
}
