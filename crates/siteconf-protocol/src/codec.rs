//! Codec for action parameters and responses.
//!
//! Actions receive their parameters as a JSON object and answer with a JSON
//! envelope. This module provides encoding and decoding utilities for both.

use crate::messages::{ActionResponse, ShowRequest};
use siteconf_core::ConfigValue;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during parameter decoding or response encoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON (de)serialization failed.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Parameters were not a JSON object.
    #[error("Parameters must be a JSON object")]
    NotAnObject,

    /// A parameter value was an array or object.
    #[error("Value of '{0}' must be a scalar")]
    NonScalar(String),

    /// A required parameter is absent.
    #[error("Missing value: {0}")]
    Missing(&'static str),
}

/// Decode `config_option_update` parameters into key/value pairs.
pub fn decode_update_params(
    params: &serde_json::Value,
) -> Result<BTreeMap<String, ConfigValue>, CodecError> {
    let object = params.as_object().ok_or(CodecError::NotAnObject)?;

    object
        .iter()
        .map(|(key, value)| {
            ConfigValue::from_json(value)
                .map(|v| (key.clone(), v))
                .ok_or_else(|| CodecError::NonScalar(key.clone()))
        })
        .collect()
}

/// Decode `config_option_show` parameters.
pub fn decode_show_request(params: &serde_json::Value) -> Result<ShowRequest, CodecError> {
    let object = params.as_object().ok_or(CodecError::NotAnObject)?;
    match object.get("key") {
        Some(serde_json::Value::String(key)) => Ok(ShowRequest { key: key.clone() }),
        Some(_) => Err(CodecError::NonScalar("key".to_string())),
        None => Err(CodecError::Missing("key")),
    }
}

/// Decode a raw request body; an empty body means no parameters.
pub fn decode_body(body: &str) -> Result<serde_json::Value, CodecError> {
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(body).map_err(CodecError::from)
}

/// Encode a response envelope to a JSON string.
pub fn encode_response(response: &ActionResponse) -> Result<String, CodecError> {
    serde_json::to_string(response).map_err(CodecError::from)
}

/// Decode a response envelope (client side).
pub fn decode_response(text: &str) -> Result<ActionResponse, CodecError> {
    serde_json::from_str(text).map_err(CodecError::from)
}
