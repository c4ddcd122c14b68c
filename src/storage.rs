//! Durable key-value storage
//!
//! The storefront keeps two independent snapshots (the session record and
//! the cart record), each under its own key. Writes are always full
//! overwrites of a snapshot, never incremental patches.

use std::sync::Arc;

use thiserror::Error;

mod fs;
mod memory;

pub use fs::FileStore;
pub use memory::MemoryStore;

/// Key holding the serialized cart snapshot.
pub const CART_KEY: &str = "cart";

/// Key holding the serialized session record.
pub const SESSION_KEY: &str = "user";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Keys are limited to ASCII letters, digits, `-` and `_`.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The stored value is not text.
    #[error("stored value for {0:?} is unreadable")]
    Unreadable(String),

    /// Underlying file I/O failed.
    #[error("storage I/O failed")]
    Io(#[from] std::io::Error),

    /// A previous writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    /// Whether the stored value itself is bad, as opposed to the backend.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, StorageError::Unreadable(_))
    }
}

/// Abstract string key-value storage, in the manner of browser local storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the key is invalid or the backend fails.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the key is invalid or the backend fails.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the key is invalid or the backend fails.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
