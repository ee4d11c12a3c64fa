//! JSON file backed store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{KeyValueStore, StoreError};

/// Key/value store persisted as a flat JSON object.
///
/// The whole file is rewritten on every change. Two processes writing at
/// once race; the last write wins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        debug!(path = %path.display(), keys = entries.len(), "Opened storage");
        Self { path, entries }
    }

    /// Write `entries` to disk. The in-memory map is only replaced once the
    /// write has succeeded.
    fn commit(&mut self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.entries = entries;
        Ok(())
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read storage, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt storage file, starting empty");
            BTreeMap::new()
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value.to_string());
        self.commit(entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut entries = self.entries.clone();
        entries.remove(key);
        self.commit(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path);
        store.set("auth_token", "abc123").unwrap();
        store.set("dark_mode", "true").unwrap();
        store.remove("dark_mode").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("auth_token").as_deref(), Some("abc123"));
        assert_eq!(reopened.get("dark_mode"), None);
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"auth_token": "old"}"#).unwrap();
        let mut store = FileStore::open(&path);

        // Point the store below a regular file so every write fails.
        store.path = blocker.join("storage.json");
        assert!(matches!(
            store.set("auth_token", "new"),
            Err(StoreError::Write { .. })
        ));
        assert_eq!(store.get("auth_token").as_deref(), Some("old"));

        assert!(store.remove("auth_token").is_err());
        assert_eq!(store.get("auth_token").as_deref(), Some("old"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get("auth_token"), None);
    }

    #[test]
    fn non_string_values_start_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"saved_posts": [1, 2]}"#).unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get("saved_posts"), None);
    }
}
