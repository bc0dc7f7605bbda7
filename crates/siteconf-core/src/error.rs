//! Error types for configuration operations.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A supplied key is not registered, or a value failed validation.
    ///
    /// Raised before any surface is written.
    #[error("{message}")]
    Validation {
        message: String,
        /// Per-key error messages.
        errors: BTreeMap<String, Vec<String>>,
    },

    /// The persistence layer failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An option definition is malformed or registered twice.
    #[error("Registry error: {0}")]
    Registry(String),
}

impl ConfigError {
    /// A validation error without per-key details.
    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    /// A validation error carrying per-key messages.
    pub fn validation_with(
        message: impl Into<String>,
        errors: BTreeMap<String, Vec<String>>,
    ) -> Self {
        ConfigError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ConfigError::Validation { .. })
    }

    /// Per-key messages of a validation error (empty for other kinds).
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ConfigError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
