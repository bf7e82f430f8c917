//! CLI command definitions and dispatch.

pub mod bruteforce;
pub mod config;
pub mod migrate;
pub mod serve;
pub mod user;
pub mod worker;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use rpidrive_auth::PasswordHasher;
use rpidrive_cache::{CacheManager, EntityCache};
use rpidrive_core::config::AppConfig;
use rpidrive_core::error::AppError;
use rpidrive_database::PgPool;
use rpidrive_database::connection::DatabasePool;
use rpidrive_database::repositories::activity::ActivityRepository;
use rpidrive_database::repositories::user::UserRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_service::{ActivityLogger, EntityLookup, UserService};

/// RPi Drive: self-hosted personal drive
#[derive(Debug, Parser)]
#[command(name = "rpidrive-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (defaults to `$RPIDRIVE_DATA_DIR/config.yaml`)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),
    /// Run the job worker (indexing, zip jobs, link cleanup)
    Worker(worker::WorkerArgs),
    /// Apply pending database migrations
    Migrate,
    /// Clear every login brute-force counter
    ResetBruteforce(bruteforce::ResetArgs),
    /// User management
    User(user::UserArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
}

impl Commands {
    /// Name of the log file written under `web.log-dir`.
    fn process_name(&self) -> &'static str {
        match self {
            Self::Serve(_) => "server",
            Self::Worker(_) => "worker",
            _ => "cli",
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.load_config()?;
        rpidrive_core::logging::init(&config.web, self.command.process_name())?;

        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Worker(args) => worker::execute(args, &config).await,
            Commands::Migrate => migrate::execute(&config).await,
            Commands::ResetBruteforce(args) => bruteforce::execute(args, &config).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }

    fn load_config(&self) -> Result<AppConfig, AppError> {
        let path = self.config.clone().unwrap_or_else(AppConfig::config_path);
        AppConfig::load_from(&path)
    }
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<PgPool, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}

/// Helper: user service over the shared cache, so that the server sees
/// changes made from the command line.
pub fn user_service(pool: &PgPool, cache: CacheManager) -> UserService {
    let users = Arc::new(UserRepository::new(pool.clone()));
    let lookup = EntityLookup::new(
        Arc::clone(&users),
        Arc::new(VolumeRepository::new(pool.clone())),
        EntityCache::new(cache),
    );
    UserService::new(
        users,
        lookup,
        Arc::new(PasswordHasher::new()),
        ActivityLogger::new(Arc::new(ActivityRepository::new(pool.clone()))),
    )
}
