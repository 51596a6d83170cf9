use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::trace;
use uuid::Uuid;

use super::ImageFile;

/// Issues and reclaims ephemeral preview references for local images.
pub trait PreviewRegistry: Send + Sync {
    fn create(&self, file: &ImageFile) -> String;
    fn release(&self, key: &str);
}

/// Scoped preview reference. Released once, explicitly or on drop.
pub struct PreviewHandle {
    key: String,
    registry: Arc<dyn PreviewRegistry>,
    released: bool,
}

impl PreviewHandle {
    pub fn create(registry: Arc<dyn PreviewRegistry>, file: &ImageFile) -> Self {
        let key = registry.create(file);
        Self {
            key,
            registry,
            released: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.registry.release(&self.key);
        trace!(key = %self.key, "preview released");
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

#[derive(Default)]
struct RegistryState {
    live: HashSet<String>,
    releases: HashMap<String, usize>,
}

/// In-process registry that records which previews are live and how often each
/// one was released.
#[derive(Default)]
pub struct TrackingPreviewRegistry {
    state: Mutex<RegistryState>,
}

impl TrackingPreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().map(|state| state.live.len()).unwrap_or(0)
    }

    pub fn release_count(&self, key: &str) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.releases.get(key).copied())
            .unwrap_or(0)
    }

    pub fn total_releases(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.releases.values().sum())
            .unwrap_or(0)
    }
}

impl PreviewRegistry for TrackingPreviewRegistry {
    fn create(&self, file: &ImageFile) -> String {
        let key = format!("preview://{}/{}", Uuid::new_v4(), file.name());
        if let Ok(mut state) = self.state.lock() {
            state.live.insert(key.clone());
        }
        key
    }

    fn release(&self, key: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.live.remove(key);
            *state.releases.entry(key.to_string()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_release_then_drop_counts_once() {
        let registry = Arc::new(TrackingPreviewRegistry::new());
        let file = ImageFile::new("a.png", "image/png", vec![1]);
        let mut handle = PreviewHandle::create(registry.clone(), &file);
        let key = handle.key().to_string();

        assert_eq!(registry.live_count(), 1);
        handle.release();
        handle.release();
        assert!(handle.is_released());
        drop(handle);

        assert_eq!(registry.release_count(&key), 1);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn dropping_an_unreleased_handle_releases_it() {
        let registry = Arc::new(TrackingPreviewRegistry::new());
        let file = ImageFile::new("a.png", "image/png", vec![1]);
        {
            let _handle = PreviewHandle::create(registry.clone(), &file);
        }
        assert_eq!(registry.total_releases(), 1);
    }
}
