//! Run the job worker.

use std::sync::Arc;

use clap::Args;
use tokio::sync::watch;
use tracing::{info, warn};

use rpidrive_cache::CacheManager;
use rpidrive_core::config::AppConfig;
use rpidrive_core::error::AppError;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_database::repositories::share::ShareRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_worker::{Indexer, LinkCleanup, WorkerRunner, ZipJobHandler, bootstrap};

/// Arguments for the worker command
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Run a single tick and exit
    #[arg(long)]
    pub once: bool,

    /// Do not apply pending migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Execute the worker command
pub async fn execute(args: &WorkerArgs, config: &AppConfig) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    if !args.skip_migrations {
        info!("Running database migrations...");
        rpidrive_database::migration::run_migrations(&pool).await?;
    }

    let cache = CacheManager::new(&config.redis).await?;
    let users = super::user_service(&pool, cache);
    bootstrap::ensure_superuser(&users, &config.init_file()).await?;

    let files = Arc::new(FileRepository::new(pool.clone()));
    let volumes = Arc::new(VolumeRepository::new(pool.clone()));
    let jobs = Arc::new(JobRepository::new(pool.clone()));
    let shares = Arc::new(ShareRepository::new(pool));

    let runner = WorkerRunner::new(
        Indexer::new(Arc::clone(&files), Arc::clone(&volumes), Arc::clone(&jobs)),
        ZipJobHandler::new(jobs, files, volumes),
        LinkCleanup::new(shares),
        &config.worker,
        &config.indexer,
    );

    if args.once {
        let report = runner.tick().await;
        info!(
            volumes_indexed = report.volumes_indexed,
            zip_jobs = report.zip_jobs,
            links_removed = report.links_removed,
            "Single tick finished"
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        rpidrive_api::app::shutdown_signal().await;
        if shutdown_tx.send(true).is_err() {
            warn!("Worker already stopped");
        }
    });

    runner.run(shutdown_rx).await;
    Ok(())
}
