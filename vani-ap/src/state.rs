//! Shared service state
//!
//! One playback controller and one generation status per service. All
//! transitions run under async mutexes, so transitions never overlap.
//!
//! **Lock order:** `generation` before `playback`. Nothing holds either
//! lock across the remote speech request.

use crate::audio::AudioStore;
use crate::generation::GenerationStatus;
use crate::playback::{BroadcastSurface, PlaybackController, PlaybackEvent, PlaybackView};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use vani_common::events::VaniEvent;

/// Event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Shared state accessible by all handlers
pub struct SharedState {
    /// Transport state machine for the published announcement
    pub playback: Mutex<PlaybackController>,

    /// Orchestration state rendered by the UI
    pub generation: Mutex<GenerationStatus>,

    /// Published audio containers
    pub store: Arc<AudioStore>,

    /// Event broadcaster for SSE events and surface instructions
    pub event_tx: broadcast::Sender<VaniEvent>,
}

impl SharedState {
    /// Create state whose playback surface is the SSE event stream
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = Arc::new(AudioStore::new());
        let surface = Arc::new(BroadcastSurface::new(event_tx.clone()));
        let controller = PlaybackController::new(store.clone(), surface);

        Self {
            playback: Mutex::new(controller),
            generation: Mutex::new(GenerationStatus::default()),
            store,
            event_tx,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: VaniEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<VaniEvent> {
        self.event_tx.subscribe()
    }

    /// Current player display state
    pub async fn playback_view(&self) -> PlaybackView {
        self.playback.lock().await.view()
    }

    /// Apply a playback event and announce what changed
    pub async fn dispatch_playback(&self, event: PlaybackEvent) -> PlaybackView {
        let mut controller = self.playback.lock().await;
        self.dispatch_locked(&mut controller, event)
    }

    /// Apply a playback event with the controller lock already held
    pub fn dispatch_locked(
        &self,
        controller: &mut PlaybackController,
        event: PlaybackEvent,
    ) -> PlaybackView {
        let reports_position = matches!(
            event,
            PlaybackEvent::Tick { .. } | PlaybackEvent::Seek { .. }
        );
        let before = controller.session().clone();
        let after = controller.dispatch(event).clone();
        let timestamp = chrono::Utc::now();

        if let Some(previous) = before.resource() {
            if after.resource().map(|r| r.id) != Some(previous.id) {
                self.broadcast_event(VaniEvent::ResourceReleased {
                    resource_id: previous.id,
                    timestamp,
                });
            }
        }

        if before.status() != after.status() {
            self.broadcast_event(VaniEvent::PlaybackStateChanged {
                old_state: before.status(),
                new_state: after.status(),
                timestamp,
            });
        }

        if reports_position && after.resource().is_some() {
            self.broadcast_event(VaniEvent::PlaybackPosition {
                resource_id: after.resource().map(|r| r.id),
                position_seconds: after.position_seconds(),
                duration_seconds: after.duration_seconds(),
                playing: after.is_playing(),
                timestamp,
            });
        }

        after.view()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{frame, PcmBuffer, PcmFormat, ResourcePublisher};
    use vani_common::PlaybackStatus;

    fn publish(state: &SharedState) -> crate::audio::PlayableResource {
        let pcm = PcmBuffer::new(vec![0u8; 4800], PcmFormat::default()).unwrap();
        state.store.publish(frame(&pcm))
    }

    #[tokio::test]
    async fn test_default_view_is_idle() {
        let state = SharedState::new();
        let view = state.playback_view().await;
        assert_eq!(view.state, PlaybackStatus::Idle);
        assert_eq!(view.elapsed, "0:00");
        assert_eq!(view.total, "0:00");
        assert_eq!(view.slider_max, 0.0);
    }

    #[tokio::test]
    async fn test_status_changes_are_broadcast() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();
        let resource = publish(&state);

        state
            .dispatch_playback(PlaybackEvent::BindResource(resource.clone()))
            .await;

        let mut saw_load = false;
        let mut saw_state_change = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                VaniEvent::SurfaceCommand { .. } => saw_load = true,
                VaniEvent::PlaybackStateChanged {
                    old_state,
                    new_state,
                    ..
                } => {
                    assert_eq!(old_state, PlaybackStatus::Idle);
                    assert_eq!(new_state, PlaybackStatus::Ready);
                    saw_state_change = true;
                }
                _ => {}
            }
        }
        assert!(saw_load && saw_state_change);
    }

    #[tokio::test]
    async fn test_rebind_frees_store_entry() {
        let state = SharedState::new();
        let first = publish(&state);
        let second = publish(&state);

        state.dispatch_playback(PlaybackEvent::BindResource(first.clone())).await;
        assert_eq!(state.store.len(), 2);

        let mut rx = state.subscribe_events();
        state.dispatch_playback(PlaybackEvent::BindResource(second.clone())).await;

        assert!(state.store.fetch(first.id).is_none());
        assert!(state.store.fetch(second.id).is_some());

        let released: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                VaniEvent::ResourceReleased { resource_id, .. } => Some(resource_id),
                _ => None,
            })
            .collect();
        assert_eq!(released, vec![first.id]);
    }
}
