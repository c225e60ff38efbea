//! HTTP server setup and routing
//!
//! Serves the review aggregate as JSON and the dashboard front-end as
//! static files.

pub mod handlers;

use crate::config::Config;
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across HTTP handlers
///
/// Immutable after startup; each request builds its own aggregate.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Folder used when a request does not name one
    pub default_data_dir: Option<PathBuf>,
    /// Directory of dashboard front-end files
    pub static_dir: PathBuf,
    /// Blank confidential remarks before serializing
    pub redact_confidential: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_data_dir: config.data.default_dir.clone(),
            static_dir: config.server.static_dir.clone(),
            redact_confidential: config.report.redact_confidential,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/api/reviews", get(handlers::get_reviews))
        .route("/health", get(handlers::health_check))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C.
pub async fn run(config: &Config) -> Result<()> {
    let state = AppState::from_config(config);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Serving on http://{}", addr);
    info!("Static directory: {}", config.server.static_dir.display());
    match config.data.default_dir {
        Some(ref dir) => info!("Default data directory: {}", dir.display()),
        None => info!("Default data directory: (none)"),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
