//! Database configuration.

use serde::{Deserialize, Serialize};

/// `database.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    /// PostgreSQL host.
    #[serde(default = "default_host")]
    pub host: String,
    /// PostgreSQL port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Login role.
    #[serde(default = "default_user")]
    pub user: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_name(),
            user: default_user(),
            password: String::new(),
            max_connections: default_max_connections(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_name() -> String {
    "rpidrive".to_string()
}

fn default_user() -> String {
    "rpidrive".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}
