//! Server configuration file.
//!
//! ```toml
//! [server]
//! name = "siteconf"
//! bind_addr = "0.0.0.0:5000"
//! database = "/var/lib/siteconf/siteconf.db"
//!
//! [plugins]
//! enabled = ["example_configurer"]
//!
//! [options]
//! "site.title" = "Open Data Portal"
//! "site.datasets_per_page" = 20
//! ```
//!
//! Values under `[options]` seed the config store at startup; persisted
//! updates are applied on top of them.

use serde::{Deserialize, Serialize};
use siteconf_core::ConfigValue;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database path selecting an in-memory SQLite database.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the siteconf server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub plugins: PluginSettings,
    /// Initial config store values.
    pub options: BTreeMap<String, ConfigValue>,
}

/// `[server]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Server name reported by the HTTP API.
    pub name: String,
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// SQLite database file, or `:memory:`.
    pub database: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: "siteconf".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database: PathBuf::from("siteconf.db"),
        }
    }
}

/// `[plugins]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Names of built-in plugins to enable.
    pub enabled: Vec<String>,
}

impl ServerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Whether the database lives only in memory.
    pub fn in_memory_database(&self) -> bool {
        self.server.database.as_os_str() == IN_MEMORY_DATABASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_when_empty() {
        let config = ServerConfig::from_toml_str("").unwrap();

        assert_eq!(config.server.name, "siteconf");
        assert_eq!(config.server.bind_addr.port(), 5000);
        assert!(config.plugins.enabled.is_empty());
        assert!(config.options.is_empty());
        assert!(!config.in_memory_database());
    }

    #[test]
    fn test_full_file() {
        let config = ServerConfig::from_toml_str(
            r#"
            [server]
            name = "portal"
            bind_addr = "127.0.0.1:8080"
            database = ":memory:"

            [plugins]
            enabled = ["example_configurer"]

            [options]
            "site.title" = "Open Data Portal"
            "site.datasets_per_page" = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.server.name, "portal");
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(config.in_memory_database());
        assert_eq!(config.plugins.enabled, vec!["example_configurer"]);
        assert_eq!(
            config.options["site.title"],
            ConfigValue::from("Open Data Portal")
        );
        assert_eq!(config.options["site.datasets_per_page"], ConfigValue::Int(20));
    }

    #[test]
    fn test_invalid_file() {
        let err = ServerConfig::from_toml_str("[server]\nbind_addr = 12").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::load("/nonexistent/siteconf.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}
