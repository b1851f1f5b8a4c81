//! Application settings loaded from `config.toml`.
//!
//! A missing file is not an error; the defaults below apply. The
//! `DATABASE_URL` and `LOG_LEVEL` environment variables (or a `.env` file
//! loaded by the binary) override whatever the file says.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/budget_keeper.sqlite?mode=rwc";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime settings for the binary
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Default `tracing` filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log_level = level;
        }
        self
    }
}

/// Parses settings from a TOML string.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })
}

/// Loads settings from `path`, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let settings = if path.exists() {
        tracing::debug!("Loading settings from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        parse_settings(&contents)?
    } else {
        tracing::debug!("{} not found, using default settings", path.display());
        Settings::default()
    };

    Ok(settings.apply_env_overrides())
}

/// Loads settings from the default location (./config.toml)
pub fn load_default_settings() -> Result<Settings> {
    load_settings("config.toml")
}
