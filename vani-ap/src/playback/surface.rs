//! Playback surface abstraction
//!
//! The surface is whatever actually renders audio (a browser media element
//! in the HTTP deployment). The controller only issues instructions to it;
//! timing, metadata and completion come back as controller events.

use crate::audio::PlayableResource;
use tokio::sync::broadcast;
use tracing::debug;
use vani_common::events::{SurfaceInstruction, VaniEvent};

/// Receiver of transport instructions
pub trait PlaybackSurface: Send + Sync {
    /// Start loading `resource`; the surface reports metadata when ready
    fn load(&self, resource: &PlayableResource);
    fn play(&self);
    fn pause(&self);
    /// Relocate the playhead
    fn seek(&self, position_seconds: f64);
}

/// Surface that forwards instructions to SSE subscribers
///
/// Connected browsers execute the instructions on their media element and
/// call the `/surface/*` endpoints back.
#[derive(Debug, Clone)]
pub struct BroadcastSurface {
    event_tx: broadcast::Sender<VaniEvent>,
}

impl BroadcastSurface {
    pub fn new(event_tx: broadcast::Sender<VaniEvent>) -> Self {
        Self { event_tx }
    }

    fn send(&self, instruction: SurfaceInstruction) {
        debug!("Surface instruction: {:?}", instruction);
        // No connected surface is fine
        let _ = self.event_tx.send(VaniEvent::SurfaceCommand {
            instruction,
            timestamp: chrono::Utc::now(),
        });
    }
}

impl PlaybackSurface for BroadcastSurface {
    fn load(&self, resource: &PlayableResource) {
        self.send(SurfaceInstruction::Load {
            resource_id: resource.id,
            url: resource.url.clone(),
        });
    }

    fn play(&self) {
        self.send(SurfaceInstruction::Play);
    }

    fn pause(&self) {
        self.send(SurfaceInstruction::Pause);
    }

    fn seek(&self, position_seconds: f64) {
        self.send(SurfaceInstruction::Seek { position_seconds });
    }
}
