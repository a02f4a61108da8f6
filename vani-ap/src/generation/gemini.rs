//! Gemini TTS client
//!
//! Calls the `generateContent` endpoint with an audio response modality and
//! a prebuilt voice, then decodes the base64 `inlineData` part of the first
//! candidate into raw PCM.
//!
//! # API Reference
//! - Endpoint: `{base}/v1beta/models/{model}:generateContent`
//! - Audio arrives as `audio/L16;codec=pcm;rate=24000` (16-bit mono)

use crate::audio::wav::DEFAULT_SAMPLE_RATE;
use crate::audio::{PcmBuffer, PcmFormat};
use crate::error::{Error, GenerationError, Result};
use crate::generation::SpeechSynthesizer;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Default speech service base URL
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default TTS model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default prebuilt voice (clear, balanced female tone)
pub const DEFAULT_VOICE: &str = "Kore";

/// Speaker instructions sent ahead of every announcement unless overridden
pub const DEFAULT_PERSONA: &str = "\
Speaker Profile: Professional Indian female staff member at ZECODE store.
Tone: Welcoming, clear, energetic, and polite with a natural Indian accent. Suitable for a public address system.
Context: Making an in-store announcement to customers at ZECODE.
Task: Read the following text aloud exactly as written, conveying a helpful and engaging atmosphere.";

/// Default timeout for one generation request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini client settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; absence is reported per request, not at startup
    pub api_key: Option<String>,
    pub model: String,
    pub voice: String,
    pub api_base_url: String,
    pub timeout: Duration,
    /// Speaker instructions placed before the announcement text; `None`
    /// sends the bare text
    pub persona: Option<String>,
    /// Rate assumed when the response MIME type carries none
    pub default_sample_rate: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            persona: Some(DEFAULT_PERSONA.to_string()),
            default_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Speech synthesizer backed by the Gemini API
pub struct GeminiSynthesizer {
    http_client: Client,
    config: GeminiConfig,
}

impl GeminiSynthesizer {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        json!({
            "contents": [
                { "parts": [ { "text": build_prompt(self.config.persona.as_deref(), text) } ] }
            ],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSynthesizer {
    async fn synthesize(&self, text: &str) -> std::result::Result<PcmBuffer, GenerationError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(GenerationError::missing_api_key()),
        };

        debug!(
            "Requesting speech from {} (voice {}, {} chars)",
            self.config.model,
            self.config.voice,
            text.chars().count()
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Speech service returned {}: {}", status, body);
            return Err(GenerationError::Transport(service_error_message(status, &body)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::Transport(format!("Failed to parse speech service response: {}", e))
        })?;

        extract_pcm(parsed, self.config.default_sample_rate)
    }
}

/// Prepend optional speaker instructions to the announcement
pub fn build_prompt(persona: Option<&str>, text: &str) -> String {
    match persona.map(str::trim).filter(|p| !p.is_empty()) {
        Some(persona) => format!("{}\n\nText to read:\n{}", persona, text),
        None => text.to_string(),
    }
}

/// `generateContent` response (only the fields used here)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Pull the PCM payload out of the first candidate
///
/// A text part without audio is a refusal; no audio and no text is an
/// empty response.
pub fn extract_pcm(
    response: GenerateContentResponse,
    default_sample_rate: u32,
) -> std::result::Result<PcmBuffer, GenerationError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(GenerationError::no_candidates)?;

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let audio = parts.iter().find_map(|part| {
        part.inline_data
            .as_ref()
            .and_then(|inline| inline.data.as_deref().filter(|d| !d.is_empty()).map(|d| (inline, d)))
    });

    let Some((inline, data)) = audio else {
        return match parts.iter().find_map(|part| part.text.clone()) {
            Some(text) => Err(GenerationError::UpstreamRefusal(text)),
            None => Err(GenerationError::no_audio()),
        };
    };

    let bytes = general_purpose::STANDARD
        .decode(data)
        .map_err(|e| GenerationError::MalformedAudio(format!("invalid base64: {}", e)))?;

    let sample_rate = inline
        .mime_type
        .as_deref()
        .and_then(parse_sample_rate)
        .unwrap_or(default_sample_rate);

    debug!("Received {} PCM bytes at {} Hz", bytes.len(), sample_rate);
    Ok(PcmBuffer::new_unchecked(bytes, PcmFormat::mono_16bit(sample_rate)))
}

/// Read the `rate=` parameter of an audio MIME type
pub fn parse_sample_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.trim().parse::<u32>().ok())
        .filter(|&rate| rate > 0)
}

/// Best human-readable message from an error response body
fn service_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Speech service request failed with status {}", status))
}
