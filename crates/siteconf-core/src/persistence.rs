//! Persistence abstraction for `system_info` rows.
//!
//! Updated option values are stored as string key/value rows so they
//! survive restarts. A cleared option keeps its row with no value, so the
//! clear also overrides startup defaults and reaches other processes. This module provides the storage trait that backends
//! implement:
//! - `MemorySystemInfoStore` here (tests, embedding)
//! - `SqliteSystemInfoStore` in `siteconf-db`
//!
//! All methods are synchronous; async wrappers can be added at the
//! framework layer.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ConfigResult;
use crate::model::ConfigValue;
use crate::registry::OptionRegistry;
use crate::store::{ConfigStore, MemoryConfigStore};

/// Row recording when options were last changed.
///
/// Every successful update rewrites it, which lets other processes sharing
/// the same database notice that their in-memory copy is stale.
pub const CONFIG_UPDATE_KEY: &str = "site.config_update";

/// A persisted key/value row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub key: String,
    /// String form of the value, `None` for a cleared option.
    pub value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Abstract `system_info` storage.
pub trait SystemInfoStore: Send + Sync {
    /// Load a row by key.
    fn get(&self, key: &str) -> ConfigResult<Option<SystemInfo>>;

    /// Create or update every row in one transaction.
    ///
    /// Either all rows are written or none are.
    fn upsert_many(&self, rows: &[(String, Option<String>)]) -> ConfigResult<Vec<SystemInfo>>;

    /// Delete a row, returning whether it existed.
    fn delete(&self, key: &str) -> ConfigResult<bool>;

    /// All rows, sorted by key.
    fn list(&self) -> ConfigResult<Vec<SystemInfo>>;

    /// Create or update one row.
    fn upsert(&self, key: &str, value: &str) -> ConfigResult<SystemInfo> {
        let mut rows = self.upsert_many(&[(key.to_string(), Some(value.to_string()))])?;
        rows.pop().ok_or_else(|| {
            crate::error::ConfigError::Storage(format!("Upsert of '{}' returned no row", key))
        })
    }

    /// Load just the value of a row. Missing and cleared rows are `None`.
    fn get_value(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(self.get(key)?.and_then(|row| row.value))
    }
}

/// In-memory `system_info` storage.
#[derive(Debug, Default)]
pub struct MemorySystemInfoStore {
    rows: RwLock<BTreeMap<String, SystemInfo>>,
}

impl MemorySystemInfoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SystemInfoStore for MemorySystemInfoStore {
    fn get(&self, key: &str) -> ConfigResult<Option<SystemInfo>> {
        Ok(self.rows.read().get(key).cloned())
    }

    fn upsert_many(&self, rows: &[(String, Option<String>)]) -> ConfigResult<Vec<SystemInfo>> {
        let now = Utc::now();
        let mut data = self.rows.write();

        Ok(rows
            .iter()
            .map(|(key, value)| {
                let row = SystemInfo {
                    key: key.clone(),
                    value: value.clone(),
                    updated_at: now,
                };
                data.insert(key.clone(), row.clone());
                row
            })
            .collect())
    }

    fn delete(&self, key: &str) -> ConfigResult<bool> {
        Ok(self.rows.write().remove(key).is_some())
    }

    fn list(&self) -> ConfigResult<Vec<SystemInfo>> {
        Ok(self.rows.read().values().cloned().collect())
    }
}

/// Copy persisted values of registered options into the config store.
///
/// Each row is parsed with its option's value kind. Rows for keys that are
/// not registered (options of a plugin no longer enabled, bookkeeping rows)
/// are skipped. Returns the keys that were loaded.
pub fn load_persisted(
    registry: &OptionRegistry,
    persistence: &dyn SystemInfoStore,
    store: &mut MemoryConfigStore,
) -> ConfigResult<Vec<String>> {
    let mut loaded = Vec::new();

    for row in persistence.list()? {
        let Some(def) = registry.get(&row.key) else {
            debug!("Skipping persisted row for unregistered key '{}'", row.key);
            continue;
        };

        let value = match &row.value {
            Some(stored) => def.kind.parse_stored(stored),
            None => ConfigValue::Null,
        };
        store.set(&row.key, value);
        loaded.push(row.key);
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueKind;
    use crate::registry::OptionDefinition;

    #[test]
    fn test_upsert_creates_then_updates() {
        let storage = MemorySystemInfoStore::new();

        let first = storage.upsert("site.title", "Portal").unwrap();
        assert_eq!(first.value.as_deref(), Some("Portal"));

        storage.upsert("site.title", "Renamed").unwrap();
        assert_eq!(
            storage.get_value("site.title").unwrap(),
            Some("Renamed".to_string())
        );
        assert_eq!(storage.list().unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let storage = MemorySystemInfoStore::new();
        storage.upsert("site.title", "Portal").unwrap();

        assert!(storage.delete("site.title").unwrap());
        assert!(!storage.delete("site.title").unwrap());
        assert!(storage.get("site.title").unwrap().is_none());
    }

    #[test]
    fn test_load_persisted_parses_kinds_and_skips_unknown() {
        let mut registry = OptionRegistry::with_core_options().unwrap();
        registry
            .register(
                OptionDefinition::builder("site.datasets_per_page")
                    .description("Datasets per page")
                    .core()
                    .kind(ValueKind::Int)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let storage = MemorySystemInfoStore::new();
        storage
            .upsert_many(&[
                ("site.datasets_per_page".to_string(), Some("5".to_string())),
                ("site.title".to_string(), Some("Portal".to_string())),
                ("ext.gone.option".to_string(), Some("x".to_string())),
                (CONFIG_UPDATE_KEY.to_string(), Some("stamp".to_string())),
            ])
            .unwrap();

        let mut store = MemoryConfigStore::new();
        let loaded = load_persisted(&registry, &storage, &mut store).unwrap();

        assert_eq!(loaded, vec!["site.datasets_per_page", "site.title"]);
        assert_eq!(store.get("site.datasets_per_page"), Some(&ConfigValue::Int(5)));
        assert_eq!(store.get("site.title"), Some(&ConfigValue::from("Portal")));
        assert!(store.get("ext.gone.option").is_none());
    }

    #[test]
    fn test_load_persisted_keeps_empty_string_apart_from_cleared() {
        let registry = OptionRegistry::with_core_options().unwrap();
        let storage = MemorySystemInfoStore::new();
        storage
            .upsert_many(&[
                ("site.title".to_string(), Some(String::new())),
                ("site.about".to_string(), None),
            ])
            .unwrap();

        let mut store = MemoryConfigStore::from_values([("site.about", ConfigValue::from("seed"))]);
        load_persisted(&registry, &storage, &mut store).unwrap();

        assert_eq!(store.get("site.title"), Some(&ConfigValue::from("")));
        assert_eq!(store.get("site.about"), Some(&ConfigValue::Null));
        assert_eq!(storage.get_value("site.about").unwrap(), None);
    }
}
