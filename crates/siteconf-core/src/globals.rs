//! Application globals mirror.
//!
//! Templates read a handful of options on every render, so the values of
//! options that declare a globals binding are mirrored into a flat
//! attribute map. Options without a binding never appear here.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::error::ConfigResult;
use crate::model::ConfigValue;
use crate::persistence::{load_persisted, SystemInfoStore, CONFIG_UPDATE_KEY};
use crate::registry::OptionRegistry;
use crate::store::{ConfigStore, MemoryConfigStore};

/// Prefix dropped from keys without an explicit attribute name.
const CORE_PREFIX: &str = "site.";

/// Precomputed attributes mirroring bound options.
#[derive(Debug, Clone, Default)]
pub struct AppGlobals {
    /// Attribute name -> value.
    attributes: HashMap<String, ConfigValue>,
    /// Option key -> attribute name.
    bindings: HashMap<String, String>,
    /// `site.config_update` stamp the mirror was last synced with.
    last_update: Option<String>,
}

impl AppGlobals {
    /// Create an empty mirror for the bindings declared in `registry`.
    pub fn new(registry: &OptionRegistry) -> Self {
        Self {
            attributes: HashMap::new(),
            bindings: registry
                .globals_bindings()
                .map(|(key, name)| (key.to_string(), name.to_string()))
                .collect(),
            last_update: None,
        }
    }

    /// Attribute name used for an option key.
    ///
    /// Bound options use their declared name. Other keys lose a leading
    /// `site.`, and anything else is used as is.
    pub fn globals_key(&self, key: &str) -> String {
        if let Some(name) = self.bindings.get(key) {
            return name.clone();
        }
        key.strip_prefix(CORE_PREFIX).unwrap_or(key).to_string()
    }

    /// Whether the option declares a globals binding.
    pub fn is_bound(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// Mirror an option value if the option is bound.
    ///
    /// Returns whether an attribute was written. A null value removes the
    /// attribute.
    pub fn set_from_config(&mut self, key: &str, value: &ConfigValue) -> bool {
        let Some(name) = self.bindings.get(key) else {
            return false;
        };

        let name = name.clone();
        self.set(name, value.clone());
        true
    }

    /// Set an attribute directly. A null value removes it.
    pub fn set(&mut self, attr: impl Into<String>, value: ConfigValue) {
        let attr = attr.into();
        if value.is_null() {
            self.attributes.remove(&attr);
        } else {
            self.attributes.insert(attr, value);
        }
    }

    /// Get an attribute by name.
    pub fn get(&self, attr: &str) -> Option<&ConfigValue> {
        self.attributes.get(attr)
    }

    /// Whether an attribute is set.
    pub fn has(&self, attr: &str) -> bool {
        self.attributes.contains_key(attr)
    }

    /// All attributes, sorted by name.
    pub fn attributes(&self) -> BTreeMap<String, ConfigValue> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Rebuild every bound attribute from the config store.
    pub fn reset(&mut self, store: &MemoryConfigStore) {
        self.attributes.clear();
        for (key, name) in &self.bindings {
            if let Some(value) = store.get(key).filter(|v| !v.is_null()) {
                self.attributes.insert(name.clone(), value.clone());
            }
        }
        debug!("Globals rebuilt with {} attributes", self.attributes.len());
    }

    /// Stamp the mirror was last synced with.
    pub fn last_update(&self) -> Option<&str> {
        self.last_update.as_deref()
    }

    /// Record the stamp the mirror is now in sync with.
    pub fn mark_updated(&mut self, stamp: impl Into<String>) {
        self.last_update = Some(stamp.into());
    }

    /// Reload persisted options if another writer changed them.
    ///
    /// Compares the persisted `site.config_update` stamp with the one last
    /// seen. When they differ, persisted values are copied into `store` and
    /// the mirror is rebuilt. Returns whether a reload happened.
    pub fn check_uptodate(
        &mut self,
        registry: &OptionRegistry,
        persistence: &dyn SystemInfoStore,
        store: &mut MemoryConfigStore,
    ) -> ConfigResult<bool> {
        let persisted = persistence.get_value(CONFIG_UPDATE_KEY)?;

        if persisted.is_none() || persisted.as_deref() == self.last_update() {
            return Ok(false);
        }

        let loaded = load_persisted(registry, persistence, store)?;
        self.reset(store);
        self.last_update = persisted;

        info!("Reloaded {} config options from storage", loaded.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueKind;
    use crate::persistence::MemorySystemInfoStore;
    use crate::registry::OptionDefinition;

    fn registry() -> OptionRegistry {
        let mut registry = OptionRegistry::with_core_options().unwrap();
        registry
            .register(
                OptionDefinition::builder("site.datasets_per_page")
                    .description("Datasets per page")
                    .core()
                    .kind(ValueKind::Int)
                    .globals("datasets_per_page")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                OptionDefinition::builder("ext.example_configurer.test_conf")
                    .description("Test option")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_globals_key() {
        let globals = AppGlobals::new(&registry());

        assert_eq!(globals.globals_key("site.datasets_per_page"), "datasets_per_page");
        assert_eq!(globals.globals_key("site.title"), "site_title");
        assert_eq!(globals.globals_key("site.unbound_thing"), "unbound_thing");
        assert_eq!(
            globals.globals_key("ext.example_configurer.test_conf"),
            "ext.example_configurer.test_conf"
        );
    }

    #[test]
    fn test_only_bound_options_are_mirrored() {
        let mut globals = AppGlobals::new(&registry());

        assert!(globals.set_from_config("site.datasets_per_page", &ConfigValue::Int(5)));
        assert!(!globals.set_from_config(
            "ext.example_configurer.test_conf",
            &ConfigValue::from("Test value")
        ));

        assert_eq!(globals.get("datasets_per_page"), Some(&ConfigValue::Int(5)));
        assert!(!globals.has("ext.example_configurer.test_conf"));
        assert_eq!(globals.attributes().len(), 1);
    }

    #[test]
    fn test_null_removes_attribute() {
        let mut globals = AppGlobals::new(&registry());
        globals.set_from_config("site.title", &ConfigValue::from("Portal"));
        globals.set_from_config("site.title", &ConfigValue::Null);

        assert!(!globals.has("site_title"));
    }

    #[test]
    fn test_set_attribute_directly() {
        let mut globals = AppGlobals::new(&registry());
        globals.set("site_logo", ConfigValue::from("/logo.png"));
        assert_eq!(globals.get("site_logo"), Some(&ConfigValue::from("/logo.png")));

        globals.set("site_logo", ConfigValue::Null);
        assert!(!globals.has("site_logo"));
    }

    #[test]
    fn test_reset_from_store() {
        let mut globals = AppGlobals::new(&registry());
        globals.set_from_config("site.about", &ConfigValue::from("stale"));

        let store = MemoryConfigStore::from_values([
            ("site.title", ConfigValue::from("Portal")),
            ("ext.example_configurer.test_conf", ConfigValue::from("x")),
        ]);
        globals.reset(&store);

        assert_eq!(globals.get("site_title"), Some(&ConfigValue::from("Portal")));
        assert!(!globals.has("site_about"));
        assert_eq!(globals.attributes().len(), 1);
    }

    #[test]
    fn test_check_uptodate_reloads_on_new_stamp() {
        let registry = registry();
        let mut globals = AppGlobals::new(&registry);
        let mut store = MemoryConfigStore::new();
        let persistence = MemorySystemInfoStore::new();

        // Nothing persisted yet
        assert!(!globals
            .check_uptodate(&registry, &persistence, &mut store)
            .unwrap());

        persistence
            .upsert_many(&[
                ("site.datasets_per_page".to_string(), Some("7".to_string())),
                (CONFIG_UPDATE_KEY.to_string(), Some("1".to_string())),
            ])
            .unwrap();

        assert!(globals
            .check_uptodate(&registry, &persistence, &mut store)
            .unwrap());
        assert_eq!(store.get("site.datasets_per_page"), Some(&ConfigValue::Int(7)));
        assert_eq!(globals.get("datasets_per_page"), Some(&ConfigValue::Int(7)));
        assert_eq!(globals.last_update(), Some("1"));

        // Same stamp: no reload
        assert!(!globals
            .check_uptodate(&registry, &persistence, &mut store)
            .unwrap());
    }
}
