// src/config.rs

//! Configuration for the crash screen.
//!
//! Deserialized from JSON. Every field has a default, so a partial file (or
//! no file at all) yields a usable configuration. The file is named by the
//! `CRASH_REPORTER_CONFIG` environment variable.

use anyhow::Context;
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "CRASH_REPORTER_CONFIG";

/// The process-wide configuration, loaded on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Root of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Background colour as an `RRGGBB` hex string.
    pub background: String,
    /// The status line drawn over the background.
    pub status: StatusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            background: "000000".to_string(),
            status: StatusConfig::default(),
        }
    }
}

/// Settings for the single line of status text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Text drawn when no log file is configured or it cannot be read.
    pub text: String,
    /// Text colour as an `RRGGBB` hex string.
    pub colour: String,
    /// Pen position of the first glyph, in buffer pixels.
    pub x: i32,
    pub y: i32,
    /// Pixel height the font is rasterized at.
    pub height_px: i32,
    /// Optional file whose last non-empty line replaces `text`.
    /// A leading `$SNAP` is expanded from the environment.
    pub log_path: Option<PathBuf>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        StatusConfig {
            text: "Something went wrong. Restarting...".to_string(),
            colour: "ffffff".to_string(),
            x: 200,
            y: 200,
            height_px: 400,
            log_path: None,
        }
    }
}

impl Config {
    /// Reads a configuration from the JSON file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Loads the file named by `CRASH_REPORTER_CONFIG`, or the defaults if the
    /// variable is unset or the file is unusable.
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load_or_default(Path::new(&path)),
            None => {
                info!("{} not set, using default configuration", CONFIG_ENV_VAR);
                Config::default()
            }
        }
    }

    /// Like `load`, but logs failures and falls back to the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!("Configuration loaded from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{:#}; using default configuration", e);
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_log::test;

    #[test]
    fn partial_files_keep_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "background": "336699", "status": {{ "height_px": 50 }} }}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.background, "336699");
        assert_eq!(config.status.height_px, 50);
        assert_eq!(config.status.x, 200);
        assert_eq!(config.status.colour, "ffffff");
        assert_eq!(config.status.log_path, None);
    }

    #[test]
    fn unreadable_or_malformed_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(Config::load(&missing).is_err());
        assert_eq!(Config::load_or_default(&missing), Config::default());

        let malformed = dir.path().join("malformed.json");
        std::fs::write(&malformed, "{ not json").unwrap();
        assert_eq!(Config::load_or_default(&malformed), Config::default());
    }
}
