//! Configuration management for landrec.
//!
//! Provides XDG-compliant configuration storage and management,
//! including search profiles and application settings.

mod profiles;
mod settings;

pub use profiles::{ProfileManager, SearchProfile, DEFAULT_INSTRUMENT_TYPES, DEFAULT_PROFILE};
pub use settings::{AppSettings, Paths};
