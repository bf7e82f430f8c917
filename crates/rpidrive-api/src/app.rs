//! Application builder: wires router, middleware and state into an Axum app
//! and serves it.

use std::net::SocketAddr;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use rpidrive_cache::CacheManager;
use rpidrive_core::config::AppConfig;
use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_database::PgPool;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(TraceLayer::new_for_http())
}

/// Runs the RPi Drive server with the given configuration and database pool.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    info!("Starting RPi Drive server...");

    // ── Step 1: Staging directory ────────────────────────────────
    tokio::fs::create_dir_all(&config.web.temp_dir)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create {}", config.web.temp_dir.display()),
                e,
            )
        })?;

    // ── Step 2: Counter and session store ────────────────────────
    info!(redis = config.redis.enabled, "Initializing cache...");
    let cache = CacheManager::new(&config.redis).await?;

    // ── Step 3: State and router ─────────────────────────────────
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = AppState::build(config, db_pool, cache);
    let app = build_app(state);

    // ── Step 4: Serve ────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    info!(%addr, "RPi Drive server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    info!("RPi Drive server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
