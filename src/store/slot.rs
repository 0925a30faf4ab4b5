use std::{
    fs,
    path::PathBuf,
    sync::Mutex,
};

use crate::errors::{Result, StoreError};
use crate::utils::{self, write_atomic};

/// A durable key-value slot holding the serialized period collection.
///
/// `read` returns `None` when nothing was ever committed, letting the store
/// distinguish "first run" from an empty collection.
pub trait StorageSlot: Send + Sync {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, data: &str) -> Result<()>;
}

/// File-backed slot with atomic tmp-rename writes.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> Self {
        Self::new(utils::store_file())
    }
}

impl StorageSlot for FileSlot {
    fn read(&self) -> Result<Option<String>> {
        if self.path.exists() {
            Ok(Some(fs::read_to_string(&self.path)?))
        } else {
            Ok(None)
        }
    }

    fn write(&self, data: &str) -> Result<()> {
        write_atomic(&self.path, data)
    }
}

/// In-memory slot for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySlot {
    data: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(data: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(data.into())),
        }
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        let guard = self
            .data
            .lock()
            .map_err(|_| StoreError::Storage("memory slot lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn write(&self, data: &str) -> Result<()> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| StoreError::Storage("memory slot lock poisoned".into()))?;
        *guard = Some(data.to_string());
        Ok(())
    }
}
