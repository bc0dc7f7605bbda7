use siteconf_server::{build_service, ServerConfig};
use siteconf_web::{create_router, ServerState};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "SITECONF_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,siteconf_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Siteconf server starting...");

    // Configuration: $SITECONF_CONFIG, then the first argument, then defaults
    let config_path = std::env::var(CONFIG_ENV)
        .ok()
        .or_else(|| std::env::args().nth(1));
    let config = match config_path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            ServerConfig::load(&path)?
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            ServerConfig::default()
        }
    };

    let service = build_service(&config)?;
    let addr = config.server.bind_addr;
    let state = Arc::new(ServerState::new(service, config.server.name.clone()));

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);
    tracing::info!("   Discovery: http://{}/api", addr);
    tracing::info!("   Actions:   http://{}/api/action/config_option_list", addr);

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
