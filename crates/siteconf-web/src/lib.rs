//! # siteconf-web
//!
//! HTTP API for the config option actions.
//!
//! ## Architecture
//!
//! The web layer is built on Axum and exposes two route groups:
//!
//! - `/api` - Discovery document
//! - `/api/action/:name` - Action calls (`GET` with query parameters or
//!   `POST` with a JSON object body)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use siteconf_web::{create_router, ServerState};
//!
//! let state = ServerState::new(service, "siteconf");
//! let app = create_router(Arc::new(state));
//!
//! let listener = TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod routes;

// Re-exports
pub use routes::create_router;

use siteconf_server::ConfigService;
use std::sync::Arc;

/// Shared server state for all route handlers.
pub struct ServerState {
    pub service: ConfigService,
    /// Server name reported by the discovery document.
    pub name: String,
    pub version: String,
}

impl ServerState {
    /// Create new server state.
    pub fn new(service: ConfigService, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<ServerState>;
