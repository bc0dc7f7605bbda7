//! Action message types.
//!
//! Every action answers with the same envelope:
//!
//! ```json
//! { "help": "config_option_show", "success": true, "result": 5 }
//! ```
//!
//! or, on failure:
//!
//! ```json
//! {
//!   "help": "config_option_update",
//!   "success": false,
//!   "error": {
//!     "__type": "Validation Error",
//!     "message": "Configuration option(s) 'ext.a' can not be updated",
//!     "ext.a": ["Option is not registered"]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use siteconf_core::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// `__type` of validation failures.
pub const VALIDATION_ERROR: &str = "Validation Error";
/// `__type` of unknown actions.
pub const NOT_FOUND_ERROR: &str = "Not Found Error";
/// `__type` of storage and other server-side failures.
pub const INTERNAL_ERROR: &str = "Internal Error";

/// Envelope fields of an error. Per-key entries never use these names.
const RESERVED_FIELDS: [&str; 2] = ["__type", "message"];

/// Actions exposed by the config service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    ConfigOptionUpdate,
    ConfigOptionList,
    ConfigOptionShow,
}

impl ActionName {
    pub const ALL: [ActionName; 3] = [
        ActionName::ConfigOptionUpdate,
        ActionName::ConfigOptionList,
        ActionName::ConfigOptionShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::ConfigOptionUpdate => "config_option_update",
            ActionName::ConfigOptionList => "config_option_list",
            ActionName::ConfigOptionShow => "config_option_show",
        }
    }

    /// Whether the action leaves options unchanged.
    pub fn is_read_only(&self) -> bool {
        !matches!(self, ActionName::ConfigOptionUpdate)
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("Action name not known: {}", s))
    }
}

/// Parameters of `config_option_show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRequest {
    pub key: String,
}

/// Error body of a failed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionError {
    #[serde(rename = "__type")]
    pub error_type: String,

    pub message: String,

    /// Per-key messages, flattened next to `message`.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ActionError {
    /// A validation error with per-key messages.
    ///
    /// Entries keyed `__type` or `message` would shadow the envelope, so
    /// they are appended to `message` instead.
    pub fn validation(
        message: impl Into<String>,
        mut fields: BTreeMap<String, Vec<String>>,
    ) -> Self {
        let mut message = message.into();
        for name in RESERVED_FIELDS {
            if let Some(errors) = fields.remove(name) {
                message.push_str(&format!(" ({}: {})", name, errors.join(", ")));
            }
        }

        Self {
            error_type: VALIDATION_ERROR.to_string(),
            message,
            fields,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error_type: NOT_FOUND_ERROR.to_string(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error_type: INTERNAL_ERROR.to_string(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.error_type == VALIDATION_ERROR
    }
}

impl From<&ConfigError> for ActionError {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::Validation { message, errors } => {
                ActionError::validation(message.clone(), errors.clone())
            }
            other => ActionError::internal(other.to_string()),
        }
    }
}

/// Response envelope of every action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Name of the action that produced the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActionResponse {
    /// A successful response.
    pub fn ok(help: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            help: Some(help.into()),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// A failed response.
    pub fn failure(help: impl Into<String>, error: ActionError) -> Self {
        Self {
            help: Some(help.into()),
            success: false,
            result: None,
            error: Some(error),
        }
    }
}
