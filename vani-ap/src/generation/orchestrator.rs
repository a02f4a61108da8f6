//! Generation orchestration
//!
//! Runs one text-to-speech request end to end: validate the text, call the
//! synthesizer, frame and publish the PCM, and bind the result to the
//! playback controller. Every failure becomes one user-visible message in
//! [`GenerationStatus::error`].
//!
//! Each request gets an increasing id. When a request finishes after a
//! newer one has started, its result is discarded without being published.

use crate::audio::{frame, PcmBuffer, PlayableResource, ResourcePublisher};
use crate::error::GenerationError;
use crate::generation::SpeechSynthesizer;
use crate::playback::PlaybackEvent;
use crate::state::SharedState;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use vani_common::events::VaniEvent;

/// Default maximum announcement length in characters
pub const DEFAULT_MAX_TEXT_CHARS: usize = 5000;

/// Orchestration state rendered by the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationStatus {
    pub is_loading: bool,
    /// Message of the last failed request
    pub error: Option<String>,
    /// Text of the latest request
    pub text: String,
    /// Id of the latest request (0 before the first)
    pub request_id: u64,
    /// Resource produced by the latest request
    pub resource: Option<PlayableResource>,
    pub duration_seconds: Option<f64>,
}

/// How an accepted request ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// Audio published and bound to the player
    Completed(PlayableResource),
    /// A newer request started first; this result was dropped
    Superseded { request_id: u64, latest_request_id: u64 },
}

/// Drives generation requests against shared state
#[derive(Clone)]
pub struct GenerationOrchestrator {
    state: Arc<SharedState>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    max_text_chars: usize,
}

impl GenerationOrchestrator {
    pub fn new(state: Arc<SharedState>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            state,
            synthesizer,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }

    pub fn max_text_chars(&self) -> usize {
        self.max_text_chars
    }

    pub async fn status(&self) -> GenerationStatus {
        self.state.generation.lock().await.clone()
    }

    /// Generate speech for `text` and make it the active resource
    ///
    /// Invalid text is rejected without touching state. Any other error is
    /// recorded in the generation status before being returned.
    pub async fn generate(&self, text: &str) -> Result<GenerateOutcome, GenerationError> {
        let text = self.validate_text(text)?;
        let request_id = self.begin(text).await;
        let guard = LoadingGuard::new(self.state.clone(), request_id);

        let result = self
            .synthesizer
            .synthesize(text)
            .await
            .and_then(validate_pcm);

        let outcome = self.finish(request_id, result).await;
        guard.disarm();
        outcome
    }

    fn validate_text<'a>(&self, text: &'a str) -> Result<&'a str, GenerationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::InvalidText(
                "Announcement text is empty.".to_string(),
            ));
        }
        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(GenerationError::InvalidText(format!(
                "Announcement text is {} characters; the limit is {}.",
                chars, self.max_text_chars
            )));
        }
        Ok(text)
    }

    /// Mark loading, clear the last error and retire the current player
    async fn begin(&self, text: &str) -> u64 {
        let mut generation = self.state.generation.lock().await;
        let mut playback = self.state.playback.lock().await;

        generation.request_id += 1;
        generation.is_loading = true;
        generation.error = None;
        generation.text = text.to_string();
        generation.resource = None;
        generation.duration_seconds = None;

        self.state.dispatch_locked(&mut playback, PlaybackEvent::Unbind);

        let request_id = generation.request_id;
        info!("Generation request {} started ({} chars)", request_id, text.chars().count());
        self.state.broadcast_event(VaniEvent::GenerationStarted {
            request_id,
            timestamp: chrono::Utc::now(),
        });
        request_id
    }

    async fn finish(
        &self,
        request_id: u64,
        result: Result<PcmBuffer, GenerationError>,
    ) -> Result<GenerateOutcome, GenerationError> {
        let mut generation = self.state.generation.lock().await;

        if generation.request_id != request_id {
            warn!(
                "Discarding result of request {} (superseded by {})",
                request_id, generation.request_id
            );
            return Ok(GenerateOutcome::Superseded {
                request_id,
                latest_request_id: generation.request_id,
            });
        }

        // Last await point: no state changes before it, none cancelled after it
        let mut playback = self.state.playback.lock().await;
        generation.is_loading = false;

        let pcm = match result {
            Ok(pcm) => pcm,
            Err(e) => {
                error!("Generation request {} failed: {}", request_id, e);
                generation.error = Some(e.to_string());
                self.state.broadcast_event(VaniEvent::GenerationFailed {
                    request_id,
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                return Err(e);
            }
        };

        let container = frame(&pcm);
        let duration_seconds = container.duration_seconds();
        let size_bytes = container.len();
        let resource = self.state.store.publish(container);
        self.state.broadcast_event(VaniEvent::ResourcePublished {
            resource_id: resource.id,
            url: resource.url.clone(),
            size_bytes,
            timestamp: chrono::Utc::now(),
        });

        self.state
            .dispatch_locked(&mut playback, PlaybackEvent::BindResource(resource.clone()));

        generation.resource = Some(resource.clone());
        generation.duration_seconds = Some(duration_seconds);

        info!(
            "Generation request {} ready: {} ({:.2}s)",
            request_id, resource.url, duration_seconds
        );
        self.state.broadcast_event(VaniEvent::GenerationCompleted {
            request_id,
            resource_id: resource.id,
            duration_seconds,
            timestamp: chrono::Utc::now(),
        });

        Ok(GenerateOutcome::Completed(resource))
    }
}

/// Message recorded when a request is dropped before it finished
pub const CANCELLED_MESSAGE: &str = "Generation was cancelled before it finished.";

/// Clears the loading flag if a started request is dropped mid-flight
struct LoadingGuard {
    state: Arc<SharedState>,
    request_id: u64,
    armed: bool,
}

impl LoadingGuard {
    fn new(state: Arc<SharedState>, request_id: u64) -> Self {
        Self {
            state,
            request_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if let Ok(mut generation) = self.state.generation.try_lock() {
            abandon(&self.state, &mut generation, self.request_id);
            return;
        }

        // Lock busy: finish the cleanup on the runtime
        let state = Arc::clone(&self.state);
        let request_id = self.request_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let mut generation = state.generation.lock().await;
                    abandon(&state, &mut generation, request_id);
                });
            }
            Err(_) => warn!(
                "Generation request {} dropped outside a runtime; loading flag left set",
                request_id
            ),
        }
    }
}

/// Record a cancelled request, unless a newer one already owns the status
fn abandon(state: &SharedState, generation: &mut GenerationStatus, request_id: u64) {
    if generation.request_id != request_id || !generation.is_loading {
        return;
    }
    warn!("Generation request {} was cancelled", request_id);
    generation.is_loading = false;
    generation.error = Some(CANCELLED_MESSAGE.to_string());
    state.broadcast_event(VaniEvent::GenerationFailed {
        request_id,
        error: CANCELLED_MESSAGE.to_string(),
        timestamp: chrono::Utc::now(),
    });
}

/// Fail fast on payloads that are not whole sample frames
fn validate_pcm(pcm: PcmBuffer) -> Result<PcmBuffer, GenerationError> {
    PcmBuffer::new(pcm.bytes, pcm.format)
        .map_err(|e| GenerationError::MalformedAudio(e.to_string()))
}
