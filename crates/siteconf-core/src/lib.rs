//! # siteconf-core
//!
//! Core configuration option model and the surfaces an update touches.
//!
//! This crate provides:
//! - Scalar option values and value kinds (coercion rules)
//! - The option registry (core and plugin-declared options)
//! - The in-memory config store
//! - The globals mirror used for fast template access
//! - The persistence abstraction for `system_info` rows
//!
//! This crate is intentionally runtime-agnostic and contains no async code.
//! Storage backends (SQLite) and HTTP surfaces live in their own crates.

pub mod error;
pub mod globals;
pub mod model;
pub mod persistence;
pub mod registry;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use globals::AppGlobals;
pub use model::{ConfigValue, ValueKind};
pub use persistence::{
    load_persisted, MemorySystemInfoStore, SystemInfo, SystemInfoStore, CONFIG_UPDATE_KEY,
};
pub use registry::{
    validators, OptionClass, OptionDefinition, OptionDefinitionBuilder, OptionRegistry,
};
pub use store::{ConfigStore, MemoryConfigStore};
