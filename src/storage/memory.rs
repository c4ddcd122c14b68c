//! In-memory store

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use super::{KeyValueStore, StorageError, validate_key};

/// Volatile store, used in tests and when no data directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<FxHashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;

        let entries = self.entries.read().map_err(|_err| StorageError::Poisoned)?;

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        let mut entries = self
            .entries
            .write()
            .map_err(|_err| StorageError::Poisoned)?;

        entries.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        let mut entries = self
            .entries
            .write()
            .map_err(|_err| StorageError::Poisoned)?;

        entries.remove(key);

        Ok(())
    }
}
