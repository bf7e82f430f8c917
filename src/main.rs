//! RPi Drive server
//!
//! Main entry point that loads the configuration, prepares the database and
//! serves the HTTP API. The job worker runs separately as `rpidrive-cli worker`.

use anyhow::Context;

use rpidrive_core::config::AppConfig;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = rpidrive_core::logging::init(&config.web, "server") {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Load `config.yaml` from the data directory, overlaid with the environment.
fn load_configuration() -> anyhow::Result<AppConfig> {
    let path = AppConfig::config_path();
    AppConfig::load_from(&path).with_context(|| format!("Config load error ({})", path.display()))
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting RPi Drive v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection ──────────────────────────────
    tracing::info!(
        host = %config.database.host,
        database = %config.database.name,
        "Connecting to database..."
    );
    let db_pool = rpidrive_database::connection::DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?
        .into_pool();

    // ── Step 2: Migrations ───────────────────────────────────────
    tracing::info!("Running database migrations...");
    rpidrive_database::migration::run_migrations(&db_pool)
        .await
        .context("Migration failed")?;
    tracing::info!("Database migrations complete");

    // ── Step 3: Serve until shutdown ─────────────────────────────
    rpidrive_api::run_server(config, db_pool)
        .await
        .context("HTTP server failed")?;

    tracing::info!("RPi Drive server shut down gracefully");
    Ok(())
}
