//! # siteconf-server
//!
//! The config option service.
//!
//! This crate provides:
//! - `ConfigService` with the `config_option_update`, `config_option_list`
//!   and `config_option_show` actions
//! - `ServerConfig`, the TOML configuration file
//! - `build_service`, wiring plugins, SQLite storage and initial values

pub mod service;
pub mod settings;

pub use service::{build_service, ConfigService};
pub use settings::{PluginSettings, ServerConfig, ServerSection, SettingsError};

// Re-export commonly used types
pub use siteconf_core::{ConfigError, ConfigResult, ConfigValue};
