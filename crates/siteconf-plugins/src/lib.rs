//! # siteconf-plugins
//!
//! Extension point letting plugins declare config options.
//!
//! A plugin implements [`ConfigurerPlugin`] and adds its own definitions to
//! the registry at startup. Options a plugin declares can then be updated at
//! runtime like core options. Plugins are plain values; discovering and
//! loading plugin code is left to the host.

pub mod example;

use siteconf_core::{ConfigError, ConfigResult, OptionRegistry};
use tracing::info;

pub use example::ExampleConfigurer;

/// A plugin contributing config option definitions.
pub trait ConfigurerPlugin: Send + Sync {
    /// Plugin name, as listed in `[plugins] enabled`.
    fn name(&self) -> &str;

    /// Add this plugin's option definitions to the registry.
    fn update_config_schema(&self, registry: &mut OptionRegistry) -> ConfigResult<()>;
}

/// Look up a plugin shipped with this crate by name.
pub fn builtin_plugin(name: &str) -> Option<Box<dyn ConfigurerPlugin>> {
    match name {
        ExampleConfigurer::NAME => Some(Box::new(ExampleConfigurer)),
        _ => None,
    }
}

/// The enabled plugins, in the order their schemas are applied.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn ConfigurerPlugin>>,
}

impl PluginSet {
    /// No plugins enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a plugin.
    pub fn with(mut self, plugin: impl ConfigurerPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Enable built-in plugins by name.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> ConfigResult<Self> {
        let mut set = Self::new();
        for name in names {
            let name = name.as_ref();
            let plugin = builtin_plugin(name)
                .ok_or_else(|| ConfigError::Registry(format!("Plugin '{}' not found", name)))?;
            set.plugins.push(plugin);
        }
        Ok(set)
    }

    /// Names of the enabled plugins.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Build the registry: core options, then each plugin's options.
    pub fn build_registry(&self) -> ConfigResult<OptionRegistry> {
        let mut registry = OptionRegistry::with_core_options()?;
        for plugin in &self.plugins {
            let before = registry.len();
            plugin.update_config_schema(&mut registry)?;
            info!(
                "Plugin '{}' registered {} config options",
                plugin.name(),
                registry.len() - before
            );
        }
        Ok(registry)
    }
}
