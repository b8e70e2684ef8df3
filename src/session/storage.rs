//! Durable key/value storage for the session profile

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;

/// String values stored under fixed keys
pub trait ProfileStorage: Send {
    /// Read the value for `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ProfileStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Write {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, value).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(?path, "stored value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove { path, source }),
        }
    }
}

/// In-memory storage for tests
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: std::collections::HashMap<String, String>,
    fail_removes: bool,
}

#[cfg(test)]
impl MemoryStorage {
    /// Storage whose `remove` always fails, leaving the value in place
    pub fn failing_removes() -> Self {
        Self {
            fail_removes: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl ProfileStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.fail_removes {
            return Err(StorageError::Remove {
                path: PathBuf::from(format!("{key}.json")),
                source: std::io::Error::new(ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.values.remove(key);
        Ok(())
    }
}
