//! Config store.
//!
//! The store is the process-wide mapping from option key to current value
//! and is authoritative for runtime reads. It holds every key the process
//! was configured with, registered or not; the registry decides which of
//! them may be changed at runtime.

use crate::model::ConfigValue;
use std::collections::{BTreeMap, HashMap};

/// Trait for config store implementations.
pub trait ConfigStore: Send + Sync {
    /// Get the current value of a key.
    fn get(&self, key: &str) -> Option<&ConfigValue>;

    /// Set a key, returning the previous value.
    fn set(&mut self, key: &str, value: ConfigValue) -> Option<ConfigValue>;

    /// Remove a key, returning the previous value.
    fn remove(&mut self, key: &str) -> Option<ConfigValue>;

    /// Whether the key currently holds a non-null value.
    fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_null())
    }

    /// All keys and values, sorted by key.
    fn snapshot(&self) -> BTreeMap<String, ConfigValue>;
}

/// In-memory config store implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    values: HashMap<String, ConfigValue>,
}

impl MemoryConfigStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with initial values (e.g. from the config file).
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, ConfigValue)>,
        K: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: ConfigValue) -> Option<ConfigValue> {
        self.values.insert(key.to_string(), value)
    }

    fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.values.remove(key)
    }

    fn snapshot(&self) -> BTreeMap<String, ConfigValue> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
