// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weight Tracker API Server
//!
//! Serves account, session and profile endpoints for the weight-loss
//! tracking app.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weight_tracker_api::{
    config::{Config, LogFormat},
    db::Database,
    services::CacheService,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env()?;

    init_logging(config.log_format);
    tracing::info!(
        port = config.port,
        environment = config.environment.as_str(),
        "Starting Weight Tracker API"
    );

    // Initialize user store
    let db = match &config.database_url {
        Some(url) => Database::connect(url).await?,
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Database::new_in_memory()
        }
    };

    // Redis connects lazily on first use
    let cache = CacheService::new(&config.redis_url(), config.cache_ttl_secs)?;
    tracing::info!(
        host = %config.redis_host,
        port = config.redis_port,
        "Redis cache configured"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db.clone(), cache));

    // Build router
    let app = weight_tracker_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down gracefully"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down gracefully"),
    }
}

/// Initialize structured logging: JSON by default, human-readable on request.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,weight_tracker_api=debug"));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}
