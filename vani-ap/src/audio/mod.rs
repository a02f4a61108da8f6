//! Audio transcoding: PCM framing and resource publishing

pub mod resource;
pub mod wav;

pub use resource::{AudioStore, PlayableResource, ResourcePublisher};
pub use wav::{frame, AudioContainer, PcmBuffer, PcmFormat, WavHeader};
