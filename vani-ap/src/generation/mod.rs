//! Speech generation
//!
//! The synthesizer seam produces raw PCM from text; the orchestrator turns
//! each result into a published, bound resource or a user-visible error.

pub mod gemini;
pub mod orchestrator;

use crate::audio::PcmBuffer;
use crate::error::GenerationError;
use async_trait::async_trait;

pub use gemini::{GeminiConfig, GeminiSynthesizer};
pub use orchestrator::{GenerateOutcome, GenerationOrchestrator, GenerationStatus};

/// Text-to-speech backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into raw PCM. One attempt, no retries.
    async fn synthesize(&self, text: &str) -> Result<PcmBuffer, GenerationError>;
}
