//! Playable resource publishing
//!
//! A framed container becomes playable once it is published: the store keeps
//! it under a fresh id and hands out a handle whose URL serves the exact
//! container bytes. Handles stay valid until released.

use crate::audio::wav::AudioContainer;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// URL prefix under which published containers are served
pub const AUDIO_URL_PREFIX: &str = "/api/v1/audio";

/// Opaque handle to a published container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlayableResource {
    pub id: Uuid,
    /// Address a media element can load
    pub url: String,
}

impl PlayableResource {
    fn for_id(id: Uuid) -> Self {
        Self {
            id,
            url: format!("{}/{}", AUDIO_URL_PREFIX, id),
        }
    }

    /// Download address for the same bytes
    pub fn download_url(&self) -> String {
        format!("{}/download", self.url)
    }
}

/// Publishes containers as playable resources
pub trait ResourcePublisher: Send + Sync {
    /// Make `container` addressable; the container is stored unmodified
    fn publish(&self, container: AudioContainer) -> PlayableResource;

    /// Invalidate `resource`. Returns false if it was already released.
    fn release(&self, resource: &PlayableResource) -> bool;
}

/// In-process store of published containers
#[derive(Debug, Default)]
pub struct AudioStore {
    resources: Mutex<HashMap<Uuid, AudioContainer>>,
}

impl AudioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the container behind a live resource id
    pub fn fetch(&self, id: Uuid) -> Option<AudioContainer> {
        self.lock().get(&id).cloned()
    }

    /// Number of live (unreleased) resources
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, AudioContainer>> {
        // Entries are inserted and removed whole, so a poisoned map is still consistent
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResourcePublisher for AudioStore {
    fn publish(&self, container: AudioContainer) -> PlayableResource {
        let resource = PlayableResource::for_id(Uuid::new_v4());
        debug!(
            "Published resource {} ({} bytes, {:.2}s)",
            resource.id,
            container.len(),
            container.duration_seconds()
        );
        self.lock().insert(resource.id, container);
        resource
    }

    fn release(&self, resource: &PlayableResource) -> bool {
        match self.lock().remove(&resource.id) {
            Some(_) => {
                debug!("Released resource {}", resource.id);
                true
            }
            None => {
                warn!("Resource {} released twice or never published", resource.id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::{frame, PcmBuffer, PcmFormat};

    fn container(len: usize) -> AudioContainer {
        frame(&PcmBuffer::new_unchecked(vec![0x11; len], PcmFormat::default()))
    }

    #[test]
    fn test_publish_serves_exact_bytes() {
        let store = AudioStore::new();
        let original = container(480);
        let resource = store.publish(original.clone());

        assert_eq!(resource.url, format!("/api/v1/audio/{}", resource.id));
        assert_eq!(resource.download_url(), format!("/api/v1/audio/{}/download", resource.id));

        let fetched = store.fetch(resource.id).expect("resource should be live");
        assert_eq!(fetched.as_bytes(), original.as_bytes());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_each_publish_gets_a_new_handle() {
        let store = AudioStore::new();
        let a = store.publish(container(2));
        let b = store.publish(container(2));
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_release_invalidates_and_is_safe_to_repeat() {
        let store = AudioStore::new();
        let resource = store.publish(container(10));

        assert!(store.release(&resource));
        assert!(store.fetch(resource.id).is_none());
        assert!(store.is_empty());

        assert!(!store.release(&resource));
    }
}
