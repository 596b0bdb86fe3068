//! Persisted key-value storage.
//!
//! The playlist and the daily cache only ever see the `KeyValueStore` port,
//! so a session can run against disk (`FileStore`) or purely in memory
//! (`MemoryStore`).

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::errors::StoreError;
use serde::{de::DeserializeOwned, Serialize};

/// String-valued persistent map, in the spirit of browser local storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes the value, replacing any previous one. Must be durable on return.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let raw = match store.get(key)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    // Empty value is treated as never written
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let value = serde_json::from_str(&raw).map_err(|e| {
        StoreError::Serialization(format!("Failed to parse '{}': {}", key, e))
    })?;
    Ok(Some(value))
}

/// Encode `value` as JSON and store it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
