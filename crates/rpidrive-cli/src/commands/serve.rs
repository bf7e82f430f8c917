//! Start the HTTP server.

use clap::Args;
use tracing::info;

use rpidrive_core::config::AppConfig;
use rpidrive_core::error::AppError;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Do not apply pending migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(ref host) = args.host {
        config.web.host = host.clone();
    }

    info!(host = %config.web.host, port = config.web.port, "Starting RPi Drive server");

    let pool = super::create_db_pool(&config).await?;

    if !args.skip_migrations {
        info!("Running database migrations...");
        rpidrive_database::migration::run_migrations(&pool).await?;
    }

    rpidrive_api::run_server(config, pool).await
}
