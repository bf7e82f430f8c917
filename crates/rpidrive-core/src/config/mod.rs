//! Application configuration schemas.
//!
//! The configuration is a single YAML document (`config.yaml`) deserialized
//! with the `config` crate. Keys are kebab-case. Each sub-module holds one
//! logical section.

pub mod database;
pub mod redis;
pub mod security;
pub mod web;
pub mod worker;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::redis::RedisConfig;
pub use self::security::{ReverseProxyConfig, SecurityConfig};
pub use self::web::WebConfig;
pub use self::worker::{IndexerConfig, WorkerConfig};

use crate::error::AppError;

/// Environment variable naming the data directory holding `config.yaml`.
pub const DATA_DIR_ENV: &str = "RPIDRIVE_DATA_DIR";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    /// HTTP server and session settings.
    #[serde(default)]
    pub web: WebConfig,
    /// Periodic indexing settings.
    #[serde(default)]
    pub indexer: IndexerConfig,
    /// PostgreSQL connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Counter store settings.
    #[serde(default)]
    pub redis: RedisConfig,
    /// Brute-force guard and cookie settings.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Client address resolution behind a proxy.
    #[serde(default)]
    pub reverse_proxy: ReverseProxyConfig,
    /// Job worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl AppConfig {
    /// Load the configuration from the default location.
    ///
    /// `$RPIDRIVE_DATA_DIR/config.yaml` is used when the variable is set,
    /// `./config.yaml` otherwise. A missing file yields the defaults.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&Self::config_path())
    }

    /// Load the configuration from an explicit file path, overlaid with
    /// `RPIDRIVE_<SECTION>__<KEY>` environment variables.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("RPIDRIVE")
                    .prefix_separator("_")
                    .separator("__")
                    .convert_case(config::Case::Kebab)
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::data_dir().join(CONFIG_FILE_NAME)
    }

    /// The data directory: `$RPIDRIVE_DATA_DIR`, or the working directory.
    pub fn data_dir() -> PathBuf {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => PathBuf::from("."),
        }
    }

    /// Reject values the rest of the system cannot work with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.web.secret_key.trim().is_empty() {
            return Err(AppError::configuration("web.secret-key must be set"));
        }
        if self.indexer.period == 0 {
            return Err(AppError::configuration(
                "indexer.period must be greater than 0",
            ));
        }
        if self.security.block_trigger == 0 {
            return Err(AppError::configuration(
                "security.block-trigger must be greater than 0",
            ));
        }
        if self.web.public_link_expiry == 0 {
            return Err(AppError::configuration(
                "web.public-link-expiry must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Path of the bootstrap credentials file.
    pub fn init_file(&self) -> PathBuf {
        self.worker
            .init_file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("init.txt"))
    }
}
