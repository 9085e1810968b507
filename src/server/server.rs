use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::api::{self, AppState};
use super::db::{BlogDb, DbHandle};
use super::rate_limit::RateLimiter;
use crate::config::AppConfig;
use crate::pipeline::{BlogPipeline, OpenAiWriter, SupadataClient};

/// Configuration for the HTTP service.
pub struct ServerConfig {
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            dev_mode: false,
        }
    }
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assemble the real pipeline and shared state from configuration.
pub fn build_state(config: &AppConfig) -> Result<Arc<AppState>> {
    if let Some(parent) = config.database_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let db = BlogDb::new(&config.database_path).context("Failed to initialize database")?;

    let pipeline = BlogPipeline::new(
        Arc::new(SupadataClient::new(config.supadata_api_key.clone())),
        Arc::new(OpenAiWriter::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
        )),
    );

    Ok(Arc::new(AppState {
        db: DbHandle::new(db),
        generator: Arc::new(pipeline),
        limiter: RateLimiter::new(config.rate_limit.clone()),
        jwt_secret: config.jwt_secret.clone(),
        token_ttl_secs: config.token_ttl_secs,
    }))
}

/// Start the HTTP service and block until shutdown.
pub async fn start_server(config: AppConfig, server: ServerConfig) -> Result<()> {
    let state = build_state(&config)?;

    let mut app = build_router(state);
    if server.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if server.dev_mode {
        "0.0.0.0"
    } else {
        config.bind_host.as_str()
    };
    let addr = format!("{}:{}", host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "blogsmith listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("shutdown requested");
}
