//! In-memory store implementation.

use crate::{StateStore, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// In-memory [`StateStore`] backed by a single mutex-guarded map.
///
/// The single lock is what makes `append` atomic: append-and-read-length
/// happens under one critical section, so two concurrent submissions can
/// never observe the same length or lose an update.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.entries.lock().insert(key.to_owned(), value);
    }

    fn append(&self, key: &str, value: Value) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(key.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        let items = entry.as_array_mut().ok_or_else(|| StoreError::WrongShape {
            key: key.to_owned(),
            detail: "expected an array".to_owned(),
        })?;
        items.push(value);
        Ok(items.len())
    }

    fn reset(&self) {
        self.entries.lock().clear();
    }
}
