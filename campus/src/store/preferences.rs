//! Shared handle over the client store.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{FileStore, KeyValueStore, MemoryStore, StoreError, DARK_MODE};

/// A change applied to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub key: String,
    /// New value, `None` when removed.
    pub value: Option<String>,
}

/// Cloneable access to the client store with change notifications.
///
/// Session, saved posts and theme all read and write through one of these,
/// so they share a single snapshot of the persisted state.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<RwLock<Box<dyn KeyValueStore>>>,
    tx: broadcast::Sender<Change>,
}

impl Preferences {
    /// Wrap a store.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self {
            store: Arc::new(RwLock::new(Box::new(store))),
            tx,
        }
    }

    /// Preferences persisted to a JSON file.
    pub fn open(path: &Path) -> Self {
        Self::new(FileStore::open(path))
    }

    /// Preferences held only in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Option<String> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
    }

    /// Write a value and notify subscribers.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value)?;
        self.notify(key, Some(value.to_string()));
        Ok(())
    }

    /// Remove a value and notify subscribers.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)?;
        self.notify(key, None);
        Ok(())
    }

    /// Receive every subsequent change.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.tx.subscribe()
    }

    /// Whether dark mode is on.
    pub fn dark_mode(&self) -> bool {
        self.get(DARK_MODE).as_deref() == Some("true")
    }

    /// Persist the dark mode flag.
    pub fn set_dark_mode(&self, enabled: bool) -> Result<(), StoreError> {
        self.set(DARK_MODE, if enabled { "true" } else { "false" })
    }

    fn notify(&self, key: &str, value: Option<String>) {
        // No subscribers is fine.
        let _ = self.tx.send(Change {
            key: key.to_string(),
            value,
        });
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AUTH_TOKEN;

    #[test]
    fn clones_share_state() {
        let prefs = Preferences::in_memory();
        let other = prefs.clone();

        prefs.set(AUTH_TOKEN, "t0k3n").unwrap();
        assert_eq!(other.get(AUTH_TOKEN).as_deref(), Some("t0k3n"));

        other.remove(AUTH_TOKEN).unwrap();
        assert_eq!(prefs.get(AUTH_TOKEN), None);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let prefs = Preferences::in_memory();
        let mut rx = prefs.subscribe();

        prefs.set_dark_mode(true).unwrap();
        prefs.remove(DARK_MODE).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.key, DARK_MODE);
        assert_eq!(first.value.as_deref(), Some("true"));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.value, None);
    }

    #[test]
    fn dark_mode_defaults_off() {
        let prefs = Preferences::in_memory();
        assert!(!prefs.dark_mode());
        prefs.set_dark_mode(true).unwrap();
        assert!(prefs.dark_mode());
    }
}
