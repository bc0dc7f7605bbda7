//! HTTP route handlers.

pub mod actions;

use crate::AppState;
use axum::{extract::State, response::Json, routing::get, Router};
use siteconf_protocol::ActionName;

/// Create the main Axum router with all routes.
///
/// Routes are organized as:
/// - `/api` - Discovery
/// - `/api/action/` - Action calls
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(discovery_handler))
        .nest("/api/action", actions::routes())
        .with_state(state)
}

/// Handler for `/api` discovery endpoint.
///
/// Returns the server identity and the available actions.
async fn discovery_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let actions: Vec<&str> = ActionName::ALL.iter().map(|a| a.as_str()).collect();
    Json(serde_json::json!({
        "server": {
            "id": state.name,
            "version": state.version
        },
        "actions": actions
    }))
}
