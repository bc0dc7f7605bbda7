//! Option registry.
//!
//! Holds the set of keys eligible for runtime update. Each definition is
//! tagged core or external, declares the value kind it accepts, and may
//! bind a globals attribute name.
//!
//! The registry is mutable while the application starts (core options are
//! seeded, then each enabled plugin adds its own) and is shared read-only
//! behind an `Arc` afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigValue, ValueKind};

/// Type alias for option validator function
pub type OptionValidator = Box<dyn Fn(&ConfigValue) -> Result<(), String> + Send + Sync>;

/// Registration class of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionClass {
    /// Built into the base system.
    Core,
    /// Declared by a plugin.
    External,
}

/// Option definition - metadata for one updatable key
pub struct OptionDefinition {
    /// Dot-separated key (e.g., "site.title")
    pub key: String,

    /// Human-readable description
    pub description: String,

    pub class: OptionClass,

    /// Kind submitted values are coerced to
    pub kind: ValueKind,

    /// Globals attribute mirroring this option, if any
    pub globals: Option<String>,

    validators: Vec<OptionValidator>,
}

impl Debug for OptionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionDefinition")
            .field("key", &self.key)
            .field("description", &self.description)
            .field("class", &self.class)
            .field("kind", &self.kind)
            .field("globals", &self.globals)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl OptionDefinition {
    /// Create a builder for constructing an OptionDefinition
    pub fn builder(key: impl Into<String>) -> OptionDefinitionBuilder {
        OptionDefinitionBuilder::new(key)
    }

    /// Coerce a submitted value to this option's kind and run its validators.
    ///
    /// Returns the coerced value, or every message produced for it.
    pub fn validate(&self, value: ConfigValue) -> Result<ConfigValue, Vec<String>> {
        let value = self.kind.coerce(value).map_err(|e| vec![e])?;

        // Null clears the option; validators only see real values
        if value.is_null() {
            return Ok(value);
        }

        let errors: Vec<String> = self
            .validators
            .iter()
            .filter_map(|validator| validator(&value).err())
            .collect();

        if errors.is_empty() {
            Ok(value)
        } else {
            Err(errors)
        }
    }
}

/// Builder for OptionDefinition with fluent API
pub struct OptionDefinitionBuilder {
    key: String,
    description: Option<String>,
    class: OptionClass,
    kind: ValueKind,
    globals: Option<String>,
    validators: Vec<OptionValidator>,
}

impl OptionDefinitionBuilder {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: None,
            class: OptionClass::External,
            kind: ValueKind::String,
            globals: None,
            validators: Vec::new(),
        }
    }

    /// Set the description (required)
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the option as a core setting
    pub fn core(mut self) -> Self {
        self.class = OptionClass::Core;
        self
    }

    /// Mark the option as plugin-declared (the default)
    pub fn external(mut self) -> Self {
        self.class = OptionClass::External;
        self
    }

    /// Set the value kind (defaults to String)
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mirror the option into the globals attribute `name`
    pub fn globals(mut self, name: impl Into<String>) -> Self {
        self.globals = Some(name.into());
        self
    }

    /// Add a validation function; validators run in insertion order
    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Box::new(f));
        self
    }

    /// Build the OptionDefinition
    pub fn build(self) -> ConfigResult<OptionDefinition> {
        validate_key(&self.key)?;

        let description = self.description.ok_or_else(|| {
            ConfigError::Registry(format!("Option '{}' needs a description", self.key))
        })?;

        if let Some(name) = &self.globals {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ConfigError::Registry(format!(
                    "Option '{}' has an invalid globals name '{}'",
                    self.key, name
                )));
            }
        }

        Ok(OptionDefinition {
            key: self.key,
            description,
            class: self.class,
            kind: self.kind,
            globals: self.globals,
            validators: self.validators,
        })
    }
}

fn validate_key(key: &str) -> ConfigResult<()> {
    let well_formed = !key.is_empty()
        && !key.contains(char::is_whitespace)
        && key.contains('.')
        && key.split('.').all(|part| !part.is_empty());

    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::Registry(format!(
            "Option key '{}' must be a dotted name",
            key
        )))
    }
}

/// Built-in validators for option definitions.
pub mod validators {
    use crate::model::ConfigValue;

    /// Integer greater than zero.
    pub fn positive_integer(value: &ConfigValue) -> Result<(), String> {
        match value {
            ConfigValue::Int(i) if *i > 0 => Ok(()),
            _ => Err("Must be a positive integer".to_string()),
        }
    }

    /// Integer zero or greater.
    pub fn natural_number(value: &ConfigValue) -> Result<(), String> {
        match value {
            ConfigValue::Int(i) if *i >= 0 => Ok(()),
            _ => Err("Must be a natural number".to_string()),
        }
    }

    /// String no longer than `max` characters.
    pub fn max_length(max: usize) -> impl Fn(&ConfigValue) -> Result<(), String> + Send + Sync {
        move |value: &ConfigValue| match value {
            ConfigValue::String(s) if s.chars().count() > max => {
                Err(format!("Length must be at most {} characters", max))
            }
            _ => Ok(()),
        }
    }
}

/// Core options: (key, description, globals attribute).
const CORE_OPTIONS: &[(&str, &str, &str)] = &[
    ("site.title", "Site title", "site_title"),
    ("site.description", "Site description", "site_description"),
    ("site.about", "About page text", "site_about"),
    ("site.intro_text", "Front page intro text", "site_intro_text"),
    ("site.custom_css", "Custom CSS injected into every page", "site_custom_css"),
    ("site.main_css", "Main stylesheet", "main_css"),
    ("site.homepage_style", "Front page layout", "homepage_style"),
    ("site.logo", "Site logo URL", "site_logo"),
];

/// Registry of updatable options
#[derive(Debug, Default)]
pub struct OptionRegistry {
    definitions: BTreeMap<String, OptionDefinition>,
}

impl OptionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the core options.
    pub fn with_core_options() -> ConfigResult<Self> {
        let mut registry = Self::new();
        for (key, description, globals) in CORE_OPTIONS {
            let def = OptionDefinition::builder(*key)
                .description(*description)
                .core()
                .globals(*globals)
                .build()?;
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Register a new option definition
    pub fn register(&mut self, def: OptionDefinition) -> ConfigResult<()> {
        if self.definitions.contains_key(&def.key) {
            return Err(ConfigError::Registry(format!(
                "Option '{}' is already registered",
                def.key
            )));
        }
        tracing::debug!("Registered {:?} option '{}'", def.class, def.key);
        self.definitions.insert(def.key.clone(), def);
        Ok(())
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.definitions.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&OptionDefinition> {
        self.definitions.get(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &OptionDefinition> {
        self.definitions.values()
    }

    /// `(key, globals attribute)` for every option with a globals binding.
    pub fn globals_bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.definitions
            .values()
            .filter_map(|def| def.globals.as_deref().map(|name| (def.key.as_str(), name)))
    }

    /// Fail with a validation error naming every unregistered key.
    pub fn check_registered<'a, I>(&self, keys: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut unsupported: Vec<&str> = keys
            .into_iter()
            .filter(|key| !self.is_registered(key))
            .collect();

        if unsupported.is_empty() {
            return Ok(());
        }

        unsupported.sort_unstable();
        unsupported.dedup();

        let message = format!(
            "Configuration option(s) '{}' can not be updated",
            unsupported.join(" ")
        );
        let errors = unsupported
            .iter()
            .map(|key| (key.to_string(), vec!["Option is not registered".to_string()]))
            .collect();

        Err(ConfigError::validation_with(message, errors))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_options_are_registered() {
        let registry = OptionRegistry::with_core_options().unwrap();

        assert!(registry.is_registered("site.title"));
        assert!(registry.is_registered("site.logo"));
        assert!(!registry.is_registered("site.datasets_per_page"));
        assert_eq!(registry.len(), CORE_OPTIONS.len());

        let title = registry.get("site.title").unwrap();
        assert_eq!(title.class, OptionClass::Core);
        assert_eq!(title.globals.as_deref(), Some("site_title"));
    }

    #[test]
    fn test_core_table_builds_every_entry() {
        let registry = OptionRegistry::with_core_options().unwrap();

        let keys: Vec<&str> = registry.keys().collect();
        let mut expected: Vec<&str> = CORE_OPTIONS.iter().map(|(key, _, _)| *key).collect();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(registry.globals_bindings().count(), CORE_OPTIONS.len());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = OptionRegistry::with_core_options().unwrap();
        let def = OptionDefinition::builder("site.title")
            .description("again")
            .build()
            .unwrap();

        assert!(matches!(
            registry.register(def),
            Err(ConfigError::Registry(_))
        ));
    }

    #[test]
    fn test_builder_requires_description_and_dotted_key() {
        assert!(OptionDefinition::builder("plain").description("x").build().is_err());
        assert!(OptionDefinition::builder("a..b").description("x").build().is_err());
        assert!(OptionDefinition::builder("a.b").build().is_err());
        assert!(OptionDefinition::builder("a.b").description("x").build().is_ok());
    }

    #[test]
    fn test_check_registered_lists_unsupported_keys() {
        let registry = OptionRegistry::with_core_options().unwrap();

        let err = registry
            .check_registered(["site.title", "ext.b", "ext.a"])
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Configuration option(s) 'ext.a ext.b' can not be updated"
        );
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("ext.a"));
        assert!(!fields.contains_key("site.title"));
    }

    #[test]
    fn test_validate_coerces_then_runs_validators() {
        let def = OptionDefinition::builder("site.datasets_per_page")
            .description("Datasets per page")
            .core()
            .kind(ValueKind::Int)
            .validator(validators::positive_integer)
            .build()
            .unwrap();

        assert_eq!(def.validate(ConfigValue::from("5")), Ok(ConfigValue::Int(5)));
        assert_eq!(
            def.validate(ConfigValue::Int(0)),
            Err(vec!["Must be a positive integer".to_string()])
        );
        assert!(def.validate(ConfigValue::from("many")).is_err());
        assert_eq!(def.validate(ConfigValue::Null), Ok(ConfigValue::Null));
    }

    #[test]
    fn test_max_length_validator() {
        let check = validators::max_length(3);
        assert!(check(&ConfigValue::from("abc")).is_ok());
        assert!(check(&ConfigValue::from("abcd")).is_err());
    }

    #[test]
    fn test_globals_bindings() {
        let mut registry = OptionRegistry::new();
        registry
            .register(
                OptionDefinition::builder("ext.plugin.flag")
                    .description("no binding")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                OptionDefinition::builder("site.datasets_per_page")
                    .description("bound")
                    .core()
                    .globals("datasets_per_page")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let bindings: Vec<_> = registry.globals_bindings().collect();
        assert_eq!(bindings, vec![("site.datasets_per_page", "datasets_per_page")]);
    }
}
