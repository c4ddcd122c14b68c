//! File-backed store

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::warn;
use uuid::Uuid;

use super::{KeyValueStore, StorageError, validate_key};

/// Stores each key as `<root>/<key>.json`.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash mid-write leaves either the old snapshot or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the stored values.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;

        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) if error.kind() == ErrorKind::InvalidData => {
                Err(StorageError::Unreadable(key.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        fs::create_dir_all(&self.root)?;

        let tmp_path = self.root.join(format!(".{key}-{}.tmp", Uuid::now_v7()));
        let written = fs::write(&tmp_path, value).and_then(|()| fs::rename(&tmp_path, &path));

        if let Err(error) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path)
                && cleanup.kind() != ErrorKind::NotFound
            {
                warn!(path = %tmp_path.display(), error = %cleanup, "could not remove temporary file");
            }

            return Err(error.into());
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
