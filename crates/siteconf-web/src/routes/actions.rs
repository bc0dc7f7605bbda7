//! Action routes.
//!
//! # Endpoints
//!
//! ### `POST /api/action/:name`
//! Run an action with a JSON object body.
//!
//! **Request:**
//! ```json
//! { "site.datasets_per_page": 5 }
//! ```
//!
//! **Response:**
//! ```json
//! {
//!   "help": "config_option_update",
//!   "success": true,
//!   "result": { "site.datasets_per_page": 5 }
//! }
//! ```
//!
//! ### `GET /api/action/:name`
//! Run a read-only action with query parameters, e.g.
//! `/api/action/config_option_show?key=site.title`. `config_option_update`
//! is only accepted over `POST`.
//!
//! # Status codes
//!
//! - `200` success
//! - `400` unknown action or malformed body
//! - `405` update requested over `GET`
//! - `409` validation error
//! - `500` storage failure

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use siteconf_protocol::{
    decode_body, ActionError, ActionName, ActionResponse, INTERNAL_ERROR, NOT_FOUND_ERROR,
    VALIDATION_ERROR,
};
use tracing::{debug, warn};

use crate::AppState;

/// Create routes for /api/action/*.
pub fn routes() -> Router<AppState> {
    Router::new().route("/:name", get(get_action).post(post_action))
}

/// GET /api/action/:name
async fn get_action(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<ActionResponse>) {
    if let Ok(action) = name.parse::<ActionName>() {
        if !action.is_read_only() {
            let error = ActionError::validation(
                format!("Action '{}' changes options and requires POST", action),
                Default::default(),
            );
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ActionResponse::failure(name, error)),
            );
        }
    }

    let params = serde_json::Value::Object(
        query
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect(),
    );
    run(&state, &name, &params)
}

/// POST /api/action/:name
async fn post_action(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: String,
) -> (StatusCode, Json<ActionResponse>) {
    match decode_body(&body) {
        Ok(params) => run(&state, &name, &params),
        Err(e) => {
            let error = ActionError::validation(e.to_string(), Default::default());
            (
                StatusCode::BAD_REQUEST,
                Json(ActionResponse::failure(name, error)),
            )
        }
    }
}

fn run(
    state: &AppState,
    name: &str,
    params: &serde_json::Value,
) -> (StatusCode, Json<ActionResponse>) {
    // Another process may have changed options since the last request
    match state.service.check_uptodate() {
        Ok(true) => debug!("Config reloaded before '{}'", name),
        Ok(false) => {}
        Err(e) => warn!("Failed to check config freshness: {}", e),
    }

    let response = state.service.call_action(name, params);
    (status_for(&response), Json(response))
}

fn status_for(response: &ActionResponse) -> StatusCode {
    match &response.error {
        None => StatusCode::OK,
        Some(error) => match error.error_type.as_str() {
            VALIDATION_ERROR => StatusCode::CONFLICT,
            NOT_FOUND_ERROR => StatusCode::BAD_REQUEST,
            INTERNAL_ERROR => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}
