//! Unit tests for config file loading and graceful degradation
//!
//! Covers:
//! - Explicit config file paths must exist
//! - Full and partial TOML files
//! - Missing default config falls back to defaults
//!
//! Note: Uses serial_test because the fallback test changes HOME/XDG
//! environment variables.

use serial_test::serial;
use std::env;
use std::io::Write;
use vani_common::config::{load_toml_config, TomlConfig};
use vani_common::Error;

#[test]
fn test_explicit_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
api_key = "test-key"
model = "gemini-2.5-flash-preview-tts"
voice = "Kore"
port = 5750
request_timeout_secs = 45
max_text_chars = 2000
persona = "Read this as a calm station announcer."
sample_rate = 24000
"#
    )
    .unwrap();

    let config = load_toml_config(Some(file.path())).unwrap();

    assert_eq!(config.api_key.as_deref(), Some("test-key"));
    assert_eq!(config.voice.as_deref(), Some("Kore"));
    assert_eq!(config.port, Some(5750));
    assert_eq!(config.request_timeout_secs, Some(45));
    assert_eq!(config.max_text_chars, Some(2000));
    assert_eq!(config.sample_rate, Some(24000));
    assert!(config.persona.unwrap().contains("station announcer"));
}

#[test]
fn test_missing_explicit_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = load_toml_config(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_empty_file_is_all_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_no_default_file_uses_defaults() {
    let home = tempfile::tempdir().unwrap();
    let old_home = env::var("HOME").ok();
    let old_xdg = env::var("XDG_CONFIG_HOME").ok();

    env::set_var("HOME", home.path());
    env::set_var("XDG_CONFIG_HOME", home.path().join(".config"));

    let result = load_toml_config(None);

    match old_home {
        Some(v) => env::set_var("HOME", v),
        None => env::remove_var("HOME"),
    }
    match old_xdg {
        Some(v) => env::set_var("XDG_CONFIG_HOME", v),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    // /etc/vani/config.toml is not expected on a test machine
    if !std::path::Path::new("/etc/vani/config.toml").exists() {
        assert_eq!(result.unwrap(), TomlConfig::default());
    }
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_user_config_dir_file_is_found() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".config").join("vani");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "voice = \"Aoede\"\n").unwrap();

    let old_xdg = env::var("XDG_CONFIG_HOME").ok();
    env::set_var("XDG_CONFIG_HOME", home.path().join(".config"));

    let result = load_toml_config(None);

    match old_xdg {
        Some(v) => env::set_var("XDG_CONFIG_HOME", v),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(result.unwrap().voice.as_deref(), Some("Aoede"));
}
