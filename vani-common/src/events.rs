//! Event types for the Vani event system
//!
//! Events are broadcast inside a service and serialized for SSE transmission.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport status of a playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No resource bound
    #[default]
    Idle,
    /// Resource bound, metadata not yet known
    Ready,
    Paused,
    Playing,
    /// Playback reached the end of the resource
    Ended,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Ready => write!(f, "ready"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Ended => write!(f, "ended"),
        }
    }
}

/// Instruction for a remote playback surface (e.g. a browser media element)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SurfaceInstruction {
    /// Load the resource at `url` and report its metadata
    Load { resource_id: Uuid, url: String },
    Play,
    Pause,
    /// Relocate the playhead
    Seek { position_seconds: f64 },
}

/// Vani event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VaniEvent {
    /// Playback status changed
    PlaybackStateChanged {
        old_state: PlaybackStatus,
        new_state: PlaybackStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback position update
    PlaybackPosition {
        resource_id: Option<Uuid>,
        position_seconds: f64,
        duration_seconds: Option<f64>,
        playing: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Command issued to the playback surface
    SurfaceCommand {
        instruction: SurfaceInstruction,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio container published under a playable URL
    ResourcePublished {
        resource_id: Uuid,
        url: String,
        size_bytes: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playable resource released
    ResourceReleased {
        resource_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Speech generation request accepted
    GenerationStarted {
        request_id: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Speech generation produced a playable resource
    GenerationCompleted {
        request_id: u64,
        resource_id: Uuid,
        duration_seconds: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Speech generation failed; `error` is the user-visible message
    GenerationFailed {
        request_id: u64,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl VaniEvent {
    /// Get event type as string for SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            VaniEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            VaniEvent::PlaybackPosition { .. } => "PlaybackPosition",
            VaniEvent::SurfaceCommand { .. } => "SurfaceCommand",
            VaniEvent::ResourcePublished { .. } => "ResourcePublished",
            VaniEvent::ResourceReleased { .. } => "ResourceReleased",
            VaniEvent::GenerationStarted { .. } => "GenerationStarted",
            VaniEvent::GenerationCompleted { .. } => "GenerationCompleted",
            VaniEvent::GenerationFailed { .. } => "GenerationFailed",
        }
    }
}
