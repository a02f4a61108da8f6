//! Playback control: transport state machine and surface

pub mod controller;
pub mod surface;

pub use controller::{
    transition, PlaybackCommand, PlaybackController, PlaybackEvent, PlaybackSession, PlaybackView,
};
pub use surface::{BroadcastSurface, PlaybackSurface};
