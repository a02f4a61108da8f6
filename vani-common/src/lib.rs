//! # Vani Common Library
//!
//! Shared code for the Vani announcer services including:
//! - Error types
//! - Event types (VaniEvent enum) and playback status
//! - Configuration file loading
//! - Display time formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
pub use events::{PlaybackStatus, VaniEvent};
pub use human_time::format_time;
