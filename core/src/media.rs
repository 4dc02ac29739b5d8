//! Locally-addressable, revocable media blobs.
//!
//! Downloaded media is held in memory behind a `blob:` URL until the owner
//! revokes it. Nothing is released implicitly: whoever holds a
//! [`MediaHandle`] must revoke it (directly or through a [`MediaSlot`]).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use crate::errors::{LabError, LabResult};

const URL_PREFIX: &str = "blob:prompt-lab/";

/// Reference to a blob registered in a [`MediaRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle {
    id: Uuid,
    mime_type: String,
    size: usize,
}

impl MediaHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> String {
        format!("{}{}", URL_PREFIX, self.id)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Shared in-memory store of media blobs
#[derive(Debug, Clone, Default)]
pub struct MediaRegistry {
    blobs: Arc<Mutex<HashMap<Uuid, Arc<[u8]>>>>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LabResult<std::sync::MutexGuard<'_, HashMap<Uuid, Arc<[u8]>>>> {
        self.blobs
            .lock()
            .map_err(|e| LabError::Storage(format!("Media registry lock poisoned: {}", e)))
    }

    pub fn register(&self, bytes: Vec<u8>, mime_type: &str) -> LabResult<MediaHandle> {
        let handle = MediaHandle {
            id: Uuid::new_v4(),
            mime_type: mime_type.to_string(),
            size: bytes.len(),
        };
        self.lock()?.insert(handle.id, Arc::from(bytes));
        debug!(url = %handle, size = handle.size, "Registered media blob");
        Ok(handle)
    }

    pub fn read(&self, handle: &MediaHandle) -> LabResult<Arc<[u8]>> {
        self.lock()?
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| LabError::Storage(format!("Media {} has been revoked", handle)))
    }

    pub fn save_to(&self, handle: &MediaHandle, path: &Path) -> LabResult<()> {
        let bytes = self.read(handle)?;
        std::fs::write(path, &bytes[..])?;
        Ok(())
    }

    /// Releases the blob. Returns false when it was already revoked.
    pub fn revoke(&self, handle: &MediaHandle) -> bool {
        let removed = self
            .lock()
            .map(|mut blobs| blobs.remove(&handle.id).is_some())
            .unwrap_or(false);
        if removed {
            debug!(url = %handle, "Revoked media blob");
        }
        removed
    }

    #[cfg(test)]
    pub fn is_live(&self, handle: &MediaHandle) -> bool {
        self.lock()
            .map(|blobs| blobs.contains_key(&handle.id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds the currently displayed media. Replacing or dropping the slot
/// revokes the previous handle.
#[derive(Debug)]
pub struct MediaSlot {
    registry: MediaRegistry,
    current: Option<MediaHandle>,
}

impl MediaSlot {
    pub fn new(registry: MediaRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&MediaHandle> {
        self.current.as_ref()
    }

    pub fn replace(&mut self, handle: MediaHandle) {
        if let Some(previous) = self.current.replace(handle) {
            self.registry.revoke(&previous);
        }
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            self.registry.revoke(&previous);
        }
    }
}

impl Drop for MediaSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_register_read_revoke() {
        let registry = MediaRegistry::new();
        let handle = registry.register(vec![1, 2, 3], "video/mp4").unwrap();
        assert!(handle.url().starts_with("blob:prompt-lab/"));
        assert_eq!(handle.size(), 3);
        assert_eq!(&registry.read(&handle).unwrap()[..], &[1, 2, 3]);

        assert!(registry.revoke(&handle));
        assert!(!registry.revoke(&handle));
        assert!(registry.read(&handle).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempdir().unwrap();
        let registry = MediaRegistry::new();
        let handle = registry.register(b"mp4".to_vec(), "video/mp4").unwrap();
        let path = dir.path().join("out.mp4");
        registry.save_to(&handle, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"mp4");
    }

    #[test]
    fn test_slot_revokes_on_replace_and_drop() {
        let registry = MediaRegistry::new();
        let first = registry.register(vec![0], "video/mp4").unwrap();
        let second = registry.register(vec![1], "video/mp4").unwrap();
        {
            let mut slot = MediaSlot::new(registry.clone());
            slot.replace(first.clone());
            slot.replace(second.clone());
            assert!(!registry.is_live(&first));
            assert!(registry.is_live(&second));
            assert_eq!(slot.current(), Some(&second));
        }
        assert!(!registry.is_live(&second));
        assert!(registry.is_empty());
    }
}
