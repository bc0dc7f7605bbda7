//! Configuration value types.
//!
//! Option values are scalars. The wire and in-memory forms keep their
//! type (`5` stays an integer), while the persisted form is always the
//! string representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// No value (JSON `null`).
    Null,
    Bool(bool), // Must be before Int so JSON booleans stay booleans
    Int(i64),
    Float(f64),
    String(String),
}

impl ConfigValue {
    /// Convert a JSON value. Arrays and objects are not scalar and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(ConfigValue::Null),
            serde_json::Value::Bool(b) => Some(ConfigValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(ConfigValue::Int)
                .or_else(|| n.as_f64().map(ConfigValue::Float)),
            serde_json::Value::String(s) => Some(ConfigValue::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Null => serde_json::Value::Null,
            ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
            ConfigValue::Int(i) => serde_json::Value::from(*i),
            ConfigValue::Float(f) => serde_json::Value::from(*f),
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// The string stored in the `system_info` table for this value.
    ///
    /// `Null` has no stored form; its row keeps an empty value column.
    pub fn to_stored(&self) -> Option<String> {
        match self {
            ConfigValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => Ok(()),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

/// The value kind an option accepts.
///
/// Incoming values are coerced to the kind before any validator runs, so
/// `"5"` submitted for an `Int` option is stored and returned as `5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Int,
    Bool,
}

impl ValueKind {
    /// Coerce a submitted value to this kind.
    ///
    /// `Null` passes through for every kind and clears the option.
    pub fn coerce(&self, value: ConfigValue) -> Result<ConfigValue, String> {
        if value.is_null() {
            return Ok(value);
        }

        match self {
            ValueKind::String => match value {
                ConfigValue::String(_) => Ok(value),
                other => Ok(ConfigValue::String(other.to_string())),
            },
            ValueKind::Int => match value {
                ConfigValue::Int(_) => Ok(value),
                ConfigValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(ConfigValue::Int(f as i64))
                }
                ConfigValue::String(ref s) => s
                    .trim()
                    .parse::<i64>()
                    .map(ConfigValue::Int)
                    .map_err(|_| "Invalid integer".to_string()),
                _ => Err("Invalid integer".to_string()),
            },
            ValueKind::Bool => match value {
                ConfigValue::Bool(_) => Ok(value),
                ConfigValue::Int(0) => Ok(ConfigValue::Bool(false)),
                ConfigValue::Int(1) => Ok(ConfigValue::Bool(true)),
                ConfigValue::String(ref s) => parse_bool(s)
                    .map(ConfigValue::Bool)
                    .ok_or_else(|| format!("Invalid boolean: {}", s)),
                _ => Err("Invalid boolean".to_string()),
            },
        }
    }

    /// Rebuild a typed value from its persisted string.
    ///
    /// Rows that no longer parse as the option's kind are kept as strings.
    pub fn parse_stored(&self, stored: &str) -> ConfigValue {
        match self {
            ValueKind::String => ConfigValue::String(stored.to_string()),
            _ => self
                .coerce(ConfigValue::String(stored.to_string()))
                .unwrap_or_else(|_| ConfigValue::String(stored.to_string())),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_string() {
        assert_eq!(ConfigValue::Int(5).to_stored().as_deref(), Some("5"));
        assert_eq!(ConfigValue::Bool(true).to_stored().as_deref(), Some("true"));
        assert_eq!(
            ConfigValue::from("Test value").to_stored().as_deref(),
            Some("Test value")
        );
        assert_eq!(ConfigValue::from("").to_stored().as_deref(), Some(""));
        assert_eq!(ConfigValue::Null.to_stored(), None);
    }

    #[test]
    fn test_untagged_deserialize_keeps_type() {
        let values: Vec<ConfigValue> =
            serde_json::from_str(r#"[5, "5", true, null, 1.5]"#).unwrap();

        assert_eq!(
            values,
            vec![
                ConfigValue::Int(5),
                ConfigValue::String("5".to_string()),
                ConfigValue::Bool(true),
                ConfigValue::Null,
                ConfigValue::Float(1.5),
            ]
        );
    }

    #[test]
    fn test_from_json_rejects_containers() {
        assert!(ConfigValue::from_json(&serde_json::json!([1, 2])).is_none());
        assert!(ConfigValue::from_json(&serde_json::json!({"a": 1})).is_none());
        assert_eq!(
            ConfigValue::from_json(&serde_json::json!(7)),
            Some(ConfigValue::Int(7))
        );
    }

    #[test]
    fn test_int_coercion() {
        assert_eq!(
            ValueKind::Int.coerce(ConfigValue::from("5")).unwrap(),
            ConfigValue::Int(5)
        );
        assert_eq!(
            ValueKind::Int.coerce(ConfigValue::Float(3.0)).unwrap(),
            ConfigValue::Int(3)
        );
        assert!(ValueKind::Int.coerce(ConfigValue::from("five")).is_err());
        assert!(ValueKind::Int.coerce(ConfigValue::Bool(true)).is_err());
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(
            ValueKind::Bool.coerce(ConfigValue::from("yes")).unwrap(),
            ConfigValue::Bool(true)
        );
        assert_eq!(
            ValueKind::Bool.coerce(ConfigValue::Int(0)).unwrap(),
            ConfigValue::Bool(false)
        );
        assert!(ValueKind::Bool.coerce(ConfigValue::from("maybe")).is_err());
    }

    #[test]
    fn test_string_coercion_stringifies_scalars() {
        assert_eq!(
            ValueKind::String.coerce(ConfigValue::Int(42)).unwrap(),
            ConfigValue::from("42")
        );
        assert_eq!(
            ValueKind::String.coerce(ConfigValue::Null).unwrap(),
            ConfigValue::Null
        );
    }

    #[test]
    fn test_parse_stored() {
        assert_eq!(ValueKind::Int.parse_stored("5"), ConfigValue::Int(5));
        assert_eq!(ValueKind::Bool.parse_stored("true"), ConfigValue::Bool(true));
        assert_eq!(ValueKind::Int.parse_stored("oops"), ConfigValue::from("oops"));
        assert_eq!(ValueKind::String.parse_stored(""), ConfigValue::from(""));
    }
}
