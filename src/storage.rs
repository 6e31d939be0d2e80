//! Durable key-value storage and the calibration line record.
//!
//! In the browser this is `window.localStorage`; natively and in tests an
//! in-memory map stands in for it.

use std::collections::HashMap;
use thiserror::Error;

use crate::model::CalibrationLine;

/// Storage key of the persisted calibration line.
pub const LINE_KEY: &str = "lineCoordinates";

/// Errors from the durable store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage could not be reached (no window, private mode, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Writing an entry failed (quota, security error)
    #[error("Storage write failed: {0}")]
    Write(String),

    /// Record could not be serialized
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Minimal string key-value store.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store used natively and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// `window.localStorage` (WASM only).
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Open the window's local storage.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object available".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{:?}", e)))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Write(format!("{:?}", e)))
    }
}

/// Reads and writes the single calibration line record.
#[derive(Debug, Clone)]
pub struct CoordinateStore<S> {
    store: S,
}

impl<S: KeyValueStore> CoordinateStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the persisted line.
    ///
    /// A missing or unreadable record yields `None`; a corrupt record is logged
    /// and treated as absent.
    pub fn load(&self) -> Option<CalibrationLine> {
        let json = match self.store.get_item(LINE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::debug!("No calibration line stored");
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read calibration line: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(line) => Some(line),
            Err(e) => {
                log::warn!("Ignoring malformed calibration line {:?}: {}", json, e);
                None
            }
        }
    }

    /// Persist a line, overwriting any previous one.
    pub fn save(&mut self, line: &CalibrationLine) -> Result<(), StorageError> {
        let json = serde_json::to_string(line)?;
        self.store.set_item(LINE_KEY, &json)?;
        log::info!("📏 Saved calibration line {}", json);
        Ok(())
    }

    /// Remove the persisted line.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove_item(LINE_KEY)
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}
