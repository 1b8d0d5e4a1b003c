//! Key value slot that survives recreation of the hosting component.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use serde::{de::DeserializeOwned, Serialize};

pub trait SavedStateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Stores `value` under `key`, `None` removes the entry.
    fn set(&self, key: &str, value: Option<serde_json::Value>);
}

impl dyn SavedStateStore {
    /// Reads and decodes an entry. Entries that no longer decode are treated as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                tracing::warn!(key, %error, "discarding saved state entry that no longer decodes");
                None
            }
        }
    }

    pub fn set_as<T: Serialize>(&self, key: &str, value: Option<&T>) {
        let encoded = value.and_then(|value| match serde_json::to_value(value) {
            Ok(encoded) => Some(encoded),
            Err(error) => {
                tracing::warn!(key, %error, "unable to encode saved state entry");
                None
            }
        });
        self.set(key, encoded);
    }
}

#[derive(Debug, Default)]
pub struct InMemorySavedState {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl InMemorySavedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl SavedStateStore for InMemorySavedState {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Option<serde_json::Value>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => {
                entries.insert(key.to_string(), value);
            }
            None => {
                entries.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn typed_entries_round_trip_and_clear() {
        let store: Arc<dyn SavedStateStore> = Arc::new(InMemorySavedState::new());

        store.set_as("flag", Some(&true));
        assert_eq!(store.get_as::<bool>("flag"), Some(true));

        store.set_as::<bool>("flag", None);
        assert_eq!(store.get_as::<bool>("flag"), None);
    }

    #[test]
    fn undecodable_entry_reads_as_absent() {
        let store: Arc<dyn SavedStateStore> = Arc::new(InMemorySavedState::new());
        store.set("count", Some(serde_json::json!("not a number")));
        assert_eq!(store.get_as::<u32>("count"), None);
    }
}
