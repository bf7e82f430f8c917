//! Process-wide `tracing` subscriber setup shared by the server and the CLI.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::WebConfig;
use crate::error::{AppError, ErrorKind};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the level filter: `RUST_LOG` first, then `web.log-level`, then `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log file for `process` inside `dir`.
pub fn log_file_path(dir: &Path, process: &str) -> PathBuf {
    dir.join(format!("{process}.log"))
}

/// Install the global subscriber.
///
/// Stdout gets pretty output in debug mode and JSON otherwise. When
/// `web.log-dir` is set, JSON lines are also appended to
/// `<log-dir>/<process>.log`.
pub fn init(web: &WebConfig, process: &str) -> Result<(), AppError> {
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    if web.debug {
        layers.push(fmt::layer().pretty().with_target(true).boxed());
    } else {
        layers.push(fmt::layer().json().with_target(true).boxed());
    }

    if let Some(dir) = &web.log_dir {
        std::fs::create_dir_all(dir)?;
        let path = log_file_path(dir, process);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(&web.log_level))
        .try_init()
        .map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to install logging", e)
        })
}
