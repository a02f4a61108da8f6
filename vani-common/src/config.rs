//! Configuration file loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns step 3. A missing config file is not an error; the
//! service starts with defaults and logs a warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name used under the platform config directory
const CONFIG_DIR_NAME: &str = "vani";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings read from `config.toml`
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Speech service API key
    pub api_key: Option<String>,
    /// Speech model identifier
    pub model: Option<String>,
    /// Prebuilt voice name
    pub voice: Option<String>,
    /// Base URL of the speech service
    pub api_base_url: Option<String>,
    /// HTTP port for the announcer player
    pub port: Option<u16>,
    /// Timeout for one generation request
    pub request_timeout_secs: Option<u64>,
    /// Maximum accepted announcement length in characters
    pub max_text_chars: Option<usize>,
    /// Optional speaker instructions placed before the announcement text
    pub persona: Option<String>,
    /// Sample rate assumed when the service does not state one
    pub sample_rate: Option<u32>,
}

impl TomlConfig {
    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Load the TOML config
///
/// An explicitly requested file must exist. Without one, the platform
/// default location is tried and defaults are used if nothing is found.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!("Loading config file {}", path.display());
        return TomlConfig::from_file(path);
    }

    match default_config_path() {
        Some(path) => {
            debug!("Loading config file {}", path.display());
            TomlConfig::from_file(&path)
        }
        None => {
            warn!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Locate the platform config file, if one exists
///
/// Linux checks `~/.config/vani/config.toml` then `/etc/vani/config.toml`.
/// Other platforms check only the user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_leaves_other_fields_unset() {
        let config = TomlConfig::from_toml_str("voice = \"Puck\"\nport = 6100\n").unwrap();
        assert_eq!(config.voice.as_deref(), Some("Puck"));
        assert_eq!(config.port, Some(6100));
        assert!(config.api_key.is_none());
        assert!(config.max_text_chars.is_none());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = TomlConfig::from_toml_str("port = \"not a number\"");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }
}
