//! Indexer and job worker configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `indexer.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexerConfig {
    /// Minutes after which an indexed volume is considered stale.
    #[serde(default = "default_period")]
    pub period: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
        }
    }
}

/// `worker.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkerConfig {
    /// Seconds between two ticks of the job loop.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    /// Marker file receiving bootstrap superuser credentials.
    #[serde(default)]
    pub init_file: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            init_file: None,
        }
    }
}

fn default_period() -> u64 {
    180
}

fn default_tick_seconds() -> u64 {
    15
}
