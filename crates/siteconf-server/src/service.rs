//! Config option service.
//!
//! This module provides the actions that read and change config options:
//! - `update` validates every key and value, persists the stringified
//!   values, then writes the config store and the globals mirror
//! - `list` and `show` read the config store
//!
//! The config store and the globals mirror are process-wide shared state.
//! Concurrent updates are last-write-wins. The store write lock is held
//! across the database commit, so memory sees updates in commit order.
//! Lock order is store, then globals.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use siteconf_core::{
    load_persisted, AppGlobals, ConfigError, ConfigResult, ConfigStore, ConfigValue,
    MemoryConfigStore, OptionRegistry, SystemInfoStore, CONFIG_UPDATE_KEY,
};
use siteconf_db::SqliteSystemInfoStore;
use siteconf_plugins::PluginSet;
use siteconf_protocol::{
    decode_show_request, decode_update_params, ActionError, ActionName, ActionResponse,
};

use crate::settings::ServerConfig;

/// Actions over the config store, the globals mirror and persistence.
pub struct ConfigService {
    registry: Arc<OptionRegistry>,
    store: Arc<RwLock<MemoryConfigStore>>,
    globals: Arc<RwLock<AppGlobals>>,
    persistence: Arc<dyn SystemInfoStore>,
}

impl ConfigService {
    /// Create a service over an initial config store.
    ///
    /// The globals mirror is built from the initial store values.
    pub fn new(
        registry: OptionRegistry,
        store: MemoryConfigStore,
        persistence: Arc<dyn SystemInfoStore>,
    ) -> Self {
        let mut globals = AppGlobals::new(&registry);
        globals.reset(&store);

        Self {
            registry: Arc::new(registry),
            store: Arc::new(RwLock::new(store)),
            globals: Arc::new(RwLock::new(globals)),
            persistence,
        }
    }

    pub fn registry(&self) -> &Arc<OptionRegistry> {
        &self.registry
    }

    /// Shared handle to the config store.
    pub fn store(&self) -> Arc<RwLock<MemoryConfigStore>> {
        self.store.clone()
    }

    /// Shared handle to the globals mirror.
    pub fn globals(&self) -> Arc<RwLock<AppGlobals>> {
        self.globals.clone()
    }

    pub fn persistence(&self) -> &Arc<dyn SystemInfoStore> {
        &self.persistence
    }

    /// `config_option_update`: set registered options.
    ///
    /// Every key must be registered and every value must pass its option's
    /// validation, otherwise nothing is written. Values are persisted in a
    /// single transaction before the config store and globals mirror are
    /// touched, so a storage failure also leaves memory unchanged.
    ///
    /// Returns the updated options with their coerced values.
    pub fn update(
        &self,
        params: BTreeMap<String, ConfigValue>,
    ) -> ConfigResult<BTreeMap<String, ConfigValue>> {
        if let Err(e) = self.registry.check_registered(params.keys().map(String::as_str)) {
            warn!("Rejected config update: {}", e);
            return Err(e);
        }

        let mut data = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for (key, value) in params {
            let Some(def) = self.registry.get(&key) else {
                continue;
            };
            match def.validate(value) {
                Ok(value) => {
                    data.insert(key, value);
                }
                Err(messages) => {
                    errors.insert(key, messages);
                }
            }
        }

        if !errors.is_empty() {
            let keys: Vec<&str> = errors.keys().map(String::as_str).collect();
            warn!("Rejected config update, invalid values for {:?}", keys);
            return Err(ConfigError::validation_with(
                "Invalid configuration values",
                errors,
            ));
        }

        if data.is_empty() {
            return Ok(data);
        }

        {
            let mut store = self.store.write();

            let stamp = Utc::now().timestamp_micros().to_string();
            let mut rows: Vec<(String, Option<String>)> = data
                .iter()
                .map(|(key, value)| (key.clone(), value.to_stored()))
                .collect();
            rows.push((CONFIG_UPDATE_KEY.to_string(), Some(stamp.clone())));
            self.persistence.upsert_many(&rows)?;

            let mut globals = self.globals.write();
            for (key, value) in &data {
                store.set(key, value.clone());
                if globals.set_from_config(key, value) {
                    debug!("Globals attribute '{}' updated", globals.globals_key(key));
                }
            }
            globals.mark_updated(stamp);
        }

        info!(
            "Updated config options: {:?}",
            data.keys().collect::<Vec<_>>()
        );
        Ok(data)
    }

    /// `config_option_list`: registered keys currently holding a value.
    pub fn list(&self) -> Vec<String> {
        let store = self.store.read();
        self.registry
            .keys()
            .filter(|key| store.has_value(key))
            .map(String::from)
            .collect()
    }

    /// `config_option_show`: current value of a registered option.
    ///
    /// `None` when the option is registered but unset.
    pub fn show(&self, key: &str) -> ConfigResult<Option<ConfigValue>> {
        if !self.registry.is_registered(key) {
            return Err(ConfigError::validation(format!(
                "Configuration option '{}' can not be shown",
                key
            )));
        }

        Ok(self
            .store
            .read()
            .get(key)
            .filter(|value| !value.is_null())
            .cloned())
    }

    /// Apply persisted values of registered options over the config store
    /// and rebuild the globals mirror. Called once at startup.
    pub fn load_persisted(&self) -> ConfigResult<Vec<String>> {
        let stamp = self.persistence.get_value(CONFIG_UPDATE_KEY)?;

        let mut store = self.store.write();
        let loaded = load_persisted(&self.registry, self.persistence.as_ref(), &mut store)?;

        let mut globals = self.globals.write();
        globals.reset(&store);
        if let Some(stamp) = stamp {
            globals.mark_updated(stamp);
        }

        info!("Loaded {} persisted config options", loaded.len());
        Ok(loaded)
    }

    /// Reload from persistence if another process updated options.
    pub fn check_uptodate(&self) -> ConfigResult<bool> {
        let mut store = self.store.write();
        let mut globals = self.globals.write();
        globals.check_uptodate(&self.registry, self.persistence.as_ref(), &mut store)
    }

    /// Run an action by name with JSON parameters.
    pub fn call_action(&self, name: &str, params: &serde_json::Value) -> ActionResponse {
        let action = match name.parse::<ActionName>() {
            Ok(action) => action,
            Err(message) => return ActionResponse::failure(name, ActionError::not_found(message)),
        };

        match self.run_action(action, params) {
            Ok(result) => ActionResponse::ok(action.as_str(), result),
            Err(error) => ActionResponse::failure(action.as_str(), error),
        }
    }

    fn run_action(
        &self,
        action: ActionName,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, ActionError> {
        match action {
            ActionName::ConfigOptionUpdate => {
                let params = decode_update_params(params)
                    .map_err(|e| ActionError::validation(e.to_string(), BTreeMap::new()))?;
                let updated = self.update(params).map_err(|e| ActionError::from(&e))?;
                Ok(serde_json::Value::Object(
                    updated
                        .into_iter()
                        .map(|(key, value)| (key, value.to_json()))
                        .collect(),
                ))
            }
            ActionName::ConfigOptionList => Ok(serde_json::Value::from(self.list())),
            ActionName::ConfigOptionShow => {
                let req = decode_show_request(params)
                    .map_err(|e| ActionError::validation(e.to_string(), BTreeMap::new()))?;
                let value = self.show(&req.key).map_err(|e| ActionError::from(&e))?;
                Ok(value.map_or(serde_json::Value::Null, |v| v.to_json()))
            }
        }
    }
}

/// Build a service from the configuration file.
///
/// Enables the configured plugins, opens the database, seeds the config
/// store from `[options]` and applies persisted values on top.
pub fn build_service(config: &ServerConfig) -> ConfigResult<ConfigService> {
    let plugins = PluginSet::from_names(config.plugins.enabled.as_slice())?;
    let registry = plugins.build_registry()?;

    let persistence: Arc<dyn SystemInfoStore> = if config.in_memory_database() {
        Arc::new(SqliteSystemInfoStore::open_in_memory()?)
    } else {
        Arc::new(SqliteSystemInfoStore::open(&config.server.database)?)
    };

    let store = MemoryConfigStore::from_values(config.options.clone());
    let service = ConfigService::new(registry, store, persistence);
    service.load_persisted()?;

    info!(
        "Config service ready: {} options registered, plugins {:?}",
        service.registry().len(),
        plugins.names()
    );
    Ok(service)
}
