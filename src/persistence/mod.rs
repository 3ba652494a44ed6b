//! Key-value persistence contract
//!
//! The core never owns storage. Hosts hand in something that can get and set
//! string values (LocalStorage, a file, a map) and the core reads initial
//! values from it and writes updates back.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Minimal get/set storage contract
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Load a JSON value; missing or unparsable entries yield `None`
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let json = store.get(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Ignoring unreadable `{}` entry: {}", key, err);
            None
        }
    }
}

/// Store a value as JSON
pub fn save_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => store.set(key, &json),
        Err(err) => log::warn!("Failed to serialize `{}`: {}", key, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_through_store() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "numbers", &vec![1u32, 2, 3]);
        let loaded: Option<Vec<u32>> = load_json(&store, "numbers");
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_corrupt_entry_is_ignored() {
        let mut store = MemoryStore::new();
        store.set("numbers", "{not json");
        let loaded: Option<Vec<u32>> = load_json(&store, "numbers");
        assert!(loaded.is_none());
        assert!(load_json::<u32>(&store, "missing").is_none());
    }
}
