//! vani-ap specific configuration
//!
//! Command-line arguments and environment variables (handled by clap) take
//! priority over `config.toml`, which takes priority over compiled defaults.

use crate::error::{Error, Result};
use crate::generation::gemini::{self, GeminiConfig};
use crate::generation::orchestrator::DEFAULT_MAX_TEXT_CHARS;
use std::time::Duration;
use vani_common::config::TomlConfig;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5750;

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub api_base_url: Option<String>,
}

/// Announcer player configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_text_chars: usize,
    pub gemini: GeminiConfig,
}

impl Config {
    /// Merge overrides, file values and defaults
    ///
    /// An empty `persona` in the file disables the default speaker profile.
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let defaults = GeminiConfig::default();

        if file.sample_rate == Some(0) {
            return Err(Error::Config("sample_rate must be greater than 0".to_string()));
        }
        if file.max_text_chars == Some(0) {
            return Err(Error::Config("max_text_chars must be greater than 0".to_string()));
        }

        let persona = match file.persona {
            Some(persona) if persona.trim().is_empty() => None,
            Some(persona) => Some(persona),
            None => defaults.persona,
        };

        let gemini = GeminiConfig {
            api_key: overrides
                .api_key
                .or(file.api_key)
                .filter(|key| !key.trim().is_empty()),
            model: overrides.model.or(file.model).unwrap_or(defaults.model),
            voice: overrides.voice.or(file.voice).unwrap_or(defaults.voice),
            api_base_url: overrides
                .api_base_url
                .or(file.api_base_url)
                .unwrap_or_else(|| gemini::DEFAULT_API_BASE_URL.to_string()),
            timeout: file
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            persona,
            default_sample_rate: file.sample_rate.unwrap_or(defaults.default_sample_rate),
        };

        Ok(Self {
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            max_text_chars: file.max_text_chars.unwrap_or(DEFAULT_MAX_TEXT_CHARS),
            gemini,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(ConfigOverrides::default(), TomlConfig::default()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_text_chars, 5000);
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.gemini.voice, "Kore");
        assert_eq!(config.gemini.default_sample_rate, 24_000);
        assert_eq!(config.gemini.persona.as_deref(), Some(gemini::DEFAULT_PERSONA));
    }

    #[test]
    fn test_overrides_beat_file() {
        let file = TomlConfig {
            port: Some(6000),
            voice: Some("Puck".to_string()),
            api_key: Some("file-key".to_string()),
            request_timeout_secs: Some(5),
            ..TomlConfig::default()
        };
        let overrides = ConfigOverrides {
            port: Some(7000),
            api_key: Some("cli-key".to_string()),
            ..ConfigOverrides::default()
        };

        let config = Config::resolve(overrides, file).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.gemini.api_key.as_deref(), Some("cli-key"));
        assert_eq!(config.gemini.voice, "Puck");
        assert_eq!(config.gemini.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let overrides = ConfigOverrides {
            api_key: Some("  ".to_string()),
            ..ConfigOverrides::default()
        };
        let config = Config::resolve(overrides, TomlConfig::default()).unwrap();
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_file_persona_overrides_default() {
        let file = TomlConfig {
            persona: Some("Speak slowly.".to_string()),
            ..TomlConfig::default()
        };
        let config = Config::resolve(ConfigOverrides::default(), file).unwrap();
        assert_eq!(config.gemini.persona.as_deref(), Some("Speak slowly."));

        let file = TomlConfig {
            persona: Some(String::new()),
            ..TomlConfig::default()
        };
        let config = Config::resolve(ConfigOverrides::default(), file).unwrap();
        assert!(config.gemini.persona.is_none());
    }

    #[test]
    fn test_zero_sample_rate_is_rejected() {
        let file = TomlConfig {
            sample_rate: Some(0),
            ..TomlConfig::default()
        };
        let err = Config::resolve(ConfigOverrides::default(), file).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("sample_rate"));
    }

    #[test]
    fn test_zero_text_limit_is_rejected() {
        let file = TomlConfig {
            max_text_chars: Some(0),
            ..TomlConfig::default()
        };
        assert!(Config::resolve(ConfigOverrides::default(), file).is_err());
    }
}
