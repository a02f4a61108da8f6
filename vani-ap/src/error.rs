//! Error types for vani-ap
//!
//! `Error` is the module-wide error. `GenerationError` is the taxonomy of
//! speech generation failures; it never reaches the framer or the playback
//! controller and is flattened into one user-visible message by the
//! orchestrator.

use thiserror::Error;

/// Main error type for vani-ap module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// PCM payload does not describe whole sample frames
    #[error("Invalid PCM data: {0}")]
    InvalidPcm(String),

    /// Speech generation failed
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Convenience Result type using vani-ap Error
pub type Result<T> = std::result::Result<T, Error>;

/// Speech generation failures
///
/// Each variant's display string is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Required service credential is absent
    #[error("{0}")]
    Configuration(String),

    /// Service answered with text instead of audio (e.g. a safety refusal)
    #[error("Model returned text instead of audio: {0}")]
    UpstreamRefusal(String),

    /// Successful response without a usable audio payload
    #[error("{0}")]
    UpstreamEmptyResponse(String),

    /// Network or service level failure
    #[error("{0}")]
    Transport(String),

    /// Audio payload could not be decoded into whole PCM frames
    #[error("Malformed audio payload: {0}")]
    MalformedAudio(String),

    /// Announcement text rejected before any request was made
    #[error("{0}")]
    InvalidText(String),
}

impl GenerationError {
    /// Credential missing; message matches what the user sees
    pub fn missing_api_key() -> Self {
        GenerationError::Configuration(
            "API Key is missing. Please check your environment configuration.".to_string(),
        )
    }

    pub fn no_candidates() -> Self {
        GenerationError::UpstreamEmptyResponse(
            "No candidates returned from the speech service.".to_string(),
        )
    }

    pub fn no_audio() -> Self {
        GenerationError::UpstreamEmptyResponse("No audio data found in response.".to_string())
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}
