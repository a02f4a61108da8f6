//! Playback controller state machine
//!
//! Transitions are computed by the pure [`transition`] function, which
//! returns the next session plus the side-effect commands to run. The
//! [`PlaybackController`] runs those commands against the surface and the
//! resource publisher, in order, and only then commits the next session.
//! Releasing a superseded resource is therefore always complete before the
//! new resource is reported as active.
//!
//! ```text
//!            bind              metadata             play
//!   Idle ──────────▶ Ready ─────────────▶ Paused ◀────────▶ Playing
//!                      │        play        ▲       pause       │
//!                      └────────────────────┼──────────────────▶│
//!                                           │                   │ ended
//!                                           │       play        ▼
//!                                  (restart from 0) ◀──────── Ended
//! ```

use crate::audio::{PlayableResource, ResourcePublisher};
use crate::playback::surface::PlaybackSurface;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use vani_common::human_time::{format_time, format_time_opt};
use vani_common::PlaybackStatus;

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Bind a new resource, releasing the previous one
    BindResource(PlayableResource),
    /// Drop the bound resource and return to idle
    Unbind,
    /// Surface learned the media duration
    MetadataLoaded { duration_seconds: f64 },
    Play,
    Pause,
    /// Single play/pause button
    TogglePlay,
    /// Surface playhead advanced
    Tick { position_seconds: f64 },
    /// User moved the slider
    Seek { target_seconds: f64 },
    /// Surface reached the end of the media
    Ended,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    Release(PlayableResource),
    Load(PlayableResource),
    Play,
    Pause,
    Seek(f64),
}

/// Transport state of one controller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSession {
    resource: Option<PlayableResource>,
    status: PlaybackStatus,
    position_seconds: f64,
    duration_seconds: Option<f64>,
}

impl PlaybackSession {
    pub fn resource(&self) -> Option<&PlayableResource> {
        self.resource.as_ref()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    /// `None` until the surface reports metadata
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }

    /// Display snapshot for the player UI
    pub fn view(&self) -> PlaybackView {
        PlaybackView {
            state: self.status,
            is_playing: self.is_playing(),
            position_seconds: self.position_seconds,
            duration_seconds: self.duration_seconds,
            elapsed: format_time(self.position_seconds),
            total: format_time_opt(self.duration_seconds),
            slider_max: self.duration_seconds.unwrap_or(0.0),
            resource: self.resource.clone(),
        }
    }

    fn with_position(&self, position_seconds: f64) -> Self {
        Self {
            position_seconds: clamp_position(position_seconds, self.duration_seconds),
            ..self.clone()
        }
    }

    fn with_status(&self, status: PlaybackStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Serializable player display state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackView {
    pub state: PlaybackStatus,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: Option<f64>,
    /// Elapsed time as `M:SS`
    pub elapsed: String,
    /// Total time as `M:SS`
    pub total: String,
    /// Upper bound of the seek slider
    pub slider_max: f64,
    pub resource: Option<PlayableResource>,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: PlaybackSession,
    pub commands: Vec<PlaybackCommand>,
}

impl Transition {
    fn unchanged(session: &PlaybackSession) -> Self {
        Self::to(session.clone())
    }

    fn to(next: PlaybackSession) -> Self {
        Self {
            next,
            commands: Vec::new(),
        }
    }

    fn with(next: PlaybackSession, commands: Vec<PlaybackCommand>) -> Self {
        Self { next, commands }
    }
}

/// Clamp a playhead position into `[0, duration]`
///
/// With an unknown duration only the lower bound applies. NaN and infinite
/// positions collapse to 0.
pub fn clamp_position(position_seconds: f64, duration_seconds: Option<f64>) -> f64 {
    if position_seconds.is_nan() {
        return 0.0;
    }
    let bounded = match duration_seconds {
        Some(duration) => position_seconds.min(duration),
        None => position_seconds,
    };
    if bounded.is_finite() {
        bounded.max(0.0)
    } else {
        0.0
    }
}

/// Durations the surface may report as NaN or infinite (live streams)
fn known_duration(duration_seconds: f64) -> Option<f64> {
    (duration_seconds.is_finite() && duration_seconds >= 0.0).then_some(duration_seconds)
}

/// Compute the next session and its side effects
pub fn transition(session: &PlaybackSession, event: PlaybackEvent) -> Transition {
    use PlaybackStatus::*;

    match (session.status, event) {
        (_, PlaybackEvent::BindResource(resource)) => {
            let mut commands = Vec::with_capacity(2);
            if let Some(previous) = &session.resource {
                if previous.id != resource.id {
                    commands.push(PlaybackCommand::Release(previous.clone()));
                }
            }
            commands.push(PlaybackCommand::Load(resource.clone()));

            let next = PlaybackSession {
                resource: Some(resource),
                status: Ready,
                position_seconds: 0.0,
                duration_seconds: None,
            };
            Transition::with(next, commands)
        }

        (_, PlaybackEvent::Unbind) => {
            let commands = session
                .resource
                .iter()
                .cloned()
                .map(PlaybackCommand::Release)
                .collect();
            Transition::with(PlaybackSession::default(), commands)
        }

        // Nothing below applies without a resource
        (Idle, _) => Transition::unchanged(session),

        (status, PlaybackEvent::MetadataLoaded { duration_seconds }) => {
            let duration = known_duration(duration_seconds);
            let next = PlaybackSession {
                status: if status == Ready { Paused } else { status },
                duration_seconds: duration,
                position_seconds: clamp_position(session.position_seconds, duration),
                ..session.clone()
            };
            Transition::to(next)
        }

        (Ready | Paused, PlaybackEvent::Play) => {
            Transition::with(session.with_status(Playing), vec![PlaybackCommand::Play])
        }
        (Ended, PlaybackEvent::Play) => Transition::with(
            session.with_position(0.0).with_status(Playing),
            vec![PlaybackCommand::Seek(0.0), PlaybackCommand::Play],
        ),
        (Playing, PlaybackEvent::Play) => Transition::unchanged(session),

        (Playing, PlaybackEvent::Pause) => {
            Transition::with(session.with_status(Paused), vec![PlaybackCommand::Pause])
        }
        (_, PlaybackEvent::Pause) => Transition::unchanged(session),

        (Playing, PlaybackEvent::TogglePlay) => transition(session, PlaybackEvent::Pause),
        (_, PlaybackEvent::TogglePlay) => transition(session, PlaybackEvent::Play),

        (Ready | Paused | Playing, PlaybackEvent::Tick { position_seconds }) => {
            Transition::to(session.with_position(position_seconds))
        }
        (Ended, PlaybackEvent::Tick { .. }) => Transition::unchanged(session),

        (_, PlaybackEvent::Seek { target_seconds }) => {
            let next = session.with_position(target_seconds);
            let position = next.position_seconds;
            Transition::with(next, vec![PlaybackCommand::Seek(position)])
        }

        (Playing, PlaybackEvent::Ended) => Transition::with(
            session.with_position(0.0).with_status(Ended),
            vec![PlaybackCommand::Seek(0.0)],
        ),
        (_, PlaybackEvent::Ended) => Transition::unchanged(session),
    }
}

/// Owns the bound resource and drives the playback surface
pub struct PlaybackController {
    session: PlaybackSession,
    publisher: Arc<dyn ResourcePublisher>,
    surface: Arc<dyn PlaybackSurface>,
}

impl PlaybackController {
    pub fn new(publisher: Arc<dyn ResourcePublisher>, surface: Arc<dyn PlaybackSurface>) -> Self {
        Self {
            session: PlaybackSession::default(),
            publisher,
            surface,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn view(&self) -> PlaybackView {
        self.session.view()
    }

    /// Apply one event: run its commands, then commit the next session
    pub fn dispatch(&mut self, event: PlaybackEvent) -> &PlaybackSession {
        let Transition { next, commands } = transition(&self.session, event);

        for command in commands {
            self.execute(command);
        }

        if next.status != self.session.status {
            debug!("Playback {} -> {}", self.session.status, next.status);
        }
        self.session = next;
        &self.session
    }

    pub fn bind_resource(&mut self, resource: PlayableResource) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::BindResource(resource))
    }

    pub fn unbind(&mut self) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::Unbind)
    }

    pub fn metadata_loaded(&mut self, duration_seconds: f64) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::MetadataLoaded { duration_seconds })
    }

    pub fn play(&mut self) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::Play)
    }

    pub fn pause(&mut self) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::Pause)
    }

    pub fn toggle_play(&mut self) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::TogglePlay)
    }

    pub fn tick(&mut self, position_seconds: f64) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::Tick { position_seconds })
    }

    pub fn seek(&mut self, target_seconds: f64) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::Seek { target_seconds })
    }

    pub fn ended(&mut self) -> &PlaybackSession {
        self.dispatch(PlaybackEvent::Ended)
    }

    fn execute(&self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Release(resource) => {
                self.publisher.release(&resource);
            }
            PlaybackCommand::Load(resource) => self.surface.load(&resource),
            PlaybackCommand::Play => self.surface.play(),
            PlaybackCommand::Pause => self.surface.pause(),
            PlaybackCommand::Seek(position) => self.surface.seek(position),
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(resource) = self.session.resource.take() {
            self.publisher.release(&resource);
        }
    }
}
