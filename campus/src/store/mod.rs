//! Durable client-side key/value storage.
//!
//! Values are opaque strings, the same way a browser's local storage holds
//! them. Everything that persists client state goes through [`Preferences`].

mod file;
mod preferences;

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use preferences::{Change, Preferences};

/// Key holding the session token.
pub const AUTH_TOKEN: &str = "auth_token";
/// Key holding the dark mode flag (`"true"` / `"false"`).
pub const DARK_MODE: &str = "dark_mode";
/// Key holding the JSON-serialized saved post ids.
pub const SAVED_POSTS: &str = "saved_posts";

/// Storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write storage at {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode storage: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A synchronous string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, persisting immediately.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value, persisting immediately.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Non-persistent store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
