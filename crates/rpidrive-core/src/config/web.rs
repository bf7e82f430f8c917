//! Web server, session and public-link configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `web.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebConfig {
    /// Key used to sign session tokens.
    #[serde(default)]
    pub secret_key: String,
    /// Time zone name reported to clients.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Staging directory for uploads.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Default log filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Optional directory receiving log files.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Lifetime of a public file link, in seconds.
    #[serde(default = "default_public_link_expiry")]
    pub public_link_expiry: u64,
    /// Human-readable logs and verbose errors.
    #[serde(default)]
    pub debug: bool,
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Lifetime of a login session, in seconds.
    #[serde(default = "default_session_expiry")]
    pub session_expiry: u64,
    /// Maximum accepted request body, in bytes (uploads).
    #[serde(default = "default_max_body")]
    pub max_body_bytes: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            time_zone: default_time_zone(),
            temp_dir: default_temp_dir(),
            log_level: default_log_level(),
            log_dir: None,
            public_link_expiry: default_public_link_expiry(),
            debug: false,
            host: default_host(),
            port: default_port(),
            session_expiry: default_session_expiry(),
            max_body_bytes: default_max_body(),
        }
    }
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("rpidrive")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_public_link_expiry() -> u64 {
    3600
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_session_expiry() -> u64 {
    14 * 24 * 3600
}

fn default_max_body() -> u64 {
    10 * 1024 * 1024 * 1024
}
