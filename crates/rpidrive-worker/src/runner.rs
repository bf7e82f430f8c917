//! Worker runner: one tick every `worker.tick-seconds` until shutdown.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info};

use rpidrive_core::config::{IndexerConfig, WorkerConfig};

use crate::indexer::Indexer;
use crate::jobs::{LinkCleanup, ZipJobHandler};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub volumes_indexed: usize,
    pub zip_jobs: usize,
    pub links_removed: u64,
}

/// The single job worker.
#[derive(Debug, Clone)]
pub struct WorkerRunner {
    indexer: Indexer,
    zips: ZipJobHandler,
    cleanup: LinkCleanup,
    tick_interval: Duration,
    period_minutes: u64,
}

impl WorkerRunner {
    pub fn new(
        indexer: Indexer,
        zips: ZipJobHandler,
        cleanup: LinkCleanup,
        worker: &WorkerConfig,
        indexer_config: &IndexerConfig,
    ) -> Self {
        Self {
            indexer,
            zips,
            cleanup,
            tick_interval: Duration::from_secs(worker.tick_seconds.max(1)),
            period_minutes: indexer_config.period,
        }
    }

    /// Run until the cancel signal flips to `true`.
    ///
    /// A tick in progress always runs to the end so that no job is left
    /// half-written; shutdown is observed between ticks.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            tick_seconds = self.tick_interval.as_secs(),
            period_minutes = self.period_minutes,
            "Worker started"
        );

        loop {
            if *cancel.borrow() {
                break;
            }
            self.tick().await;

            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Worker received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(self.tick_interval) => {}
            }
        }

        info!("Worker shut down complete");
    }

    /// Index due volumes, drain zip jobs, then drop expired links. A failing
    /// step is logged and the next one still runs.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        match self.indexer.index_due(Utc::now(), self.period_minutes).await {
            Ok(count) => report.volumes_indexed = count,
            Err(e) => error!(error = %e, "Indexing step failed"),
        }
        match self.zips.run_pending().await {
            Ok(count) => report.zip_jobs = count,
            Err(e) => error!(error = %e, "Zip step failed"),
        }
        match self.cleanup.run(Utc::now()).await {
            Ok(count) => report.links_removed = count,
            Err(e) => error!(error = %e, "Link cleanup step failed"),
        }

        debug!(
            volumes_indexed = report.volumes_indexed,
            zip_jobs = report.zip_jobs,
            links_removed = report.links_removed,
            "Tick finished"
        );
        report
    }
}
