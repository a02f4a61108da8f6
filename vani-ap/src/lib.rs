//! Vani Announcer Player (vani-ap)
//!
//! Turns a line of text into a spoken announcement and drives a remote
//! playback surface through it.
//!
//! Pipeline:
//! - `generation` asks the speech service for raw PCM
//! - `audio` frames the PCM as a WAV container and publishes it
//! - `playback` binds the published resource to a transport state machine
//! - `api` exposes all of it over HTTP and SSE

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod generation;
pub mod playback;
pub mod state;

pub use error::{Error, GenerationError, Result};
pub use state::SharedState;
