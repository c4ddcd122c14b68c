//! Repositories
//!
//! The mock datasets (catalog, customers, orders) sit behind this interface
//! so the engine never reaches for shared global state.

use std::{
    hash::Hash,
    sync::{Arc, RwLock},
};

use thiserror::Error;

/// Repository errors.
#[derive(Debug, Error, PartialEq)]
pub enum RepositoryError {
    /// A previous writer panicked while holding the repository lock.
    #[error("repository lock poisoned")]
    Poisoned,
}

/// Something with a stable identity.
pub trait Entity: Clone {
    /// Identifier type.
    type Id: Copy + Eq + Hash;

    /// This entity's identifier.
    fn id(&self) -> Self::Id;
}

/// Capability set over a collection of entities.
pub trait Repository<T: Entity>: Send + Sync {
    /// Find a single entity.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if the backing collection is unavailable.
    fn find_by_id(&self, id: T::Id) -> Result<Option<T>, RepositoryError>;

    /// All entities, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if the backing collection is unavailable.
    fn list(&self) -> Result<Vec<T>, RepositoryError>;

    /// Insert or replace an entity by id.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if the backing collection is unavailable.
    fn save(&self, entity: T) -> Result<(), RepositoryError>;
}

impl<T: Entity, R: Repository<T> + ?Sized> Repository<T> for Arc<R> {
    fn find_by_id(&self, id: T::Id) -> Result<Option<T>, RepositoryError> {
        (**self).find_by_id(id)
    }

    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        (**self).list()
    }

    fn save(&self, entity: T) -> Result<(), RepositoryError> {
        (**self).save(entity)
    }
}

/// Vector-backed repository preserving insertion order.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    entries: RwLock<Vec<T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Entity> InMemoryRepository<T> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = T>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Entity + Send + Sync,
{
    fn find_by_id(&self, id: T::Id) -> Result<Option<T>, RepositoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_err| RepositoryError::Poisoned)?;

        Ok(entries.iter().find(|entry| entry.id() == id).cloned())
    }

    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_err| RepositoryError::Poisoned)?;

        Ok(entries.clone())
    }

    fn save(&self, entity: T) -> Result<(), RepositoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_err| RepositoryError::Poisoned)?;

        match entries.iter_mut().find(|entry| entry.id() == entity.id()) {
            Some(existing) => *existing = entity,
            None => entries.push(entity),
        }

        Ok(())
    }
}
