//! Application settings loading from `sharaf.toml`.
//!
//! All keys are optional. Environment variables (possibly loaded from `.env` by the binary)
//! take precedence over the file for the database URL and the log filter.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default settings file looked up in the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "sharaf.toml";

/// Configuration structure representing the entire sharaf.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Database URL used when `DATABASE_URL` is not set
    #[serde(default)]
    pub database_url: Option<String>,
    /// `tracing` filter directive used when `RUST_LOG` is not set
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Actor recorded on mappings and shift audits when none is given on the command line
    #[serde(default)]
    pub default_actor: Option<String>,
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `./sharaf.toml`, falling back to defaults when the file is absent.
pub fn load_default_settings() -> Result<Settings> {
    if Path::new(DEFAULT_SETTINGS_PATH).exists() {
        load_settings(DEFAULT_SETTINGS_PATH)
    } else {
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml_str = r#"
            database_url = "sqlite://data/test.sqlite?mode=rwc"
            log_filter = "sharaf_shift=debug"
            default_actor = "admin"
        "#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(
            settings.database_url.as_deref(),
            Some("sqlite://data/test.sqlite?mode=rwc")
        );
        assert_eq!(settings.log_filter.as_deref(), Some("sharaf_shift=debug"));
        assert_eq!(settings.default_actor.as_deref(), Some("admin"));
    }

    #[test]
    fn test_parse_empty_settings() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_missing_file() {
        let result = load_settings("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
