//! Counter store configuration.

use serde::{Deserialize, Serialize};

/// `redis.*` section.
///
/// When `enabled` is false the in-process store is used instead; that is
/// only correct when the server runs as a single process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RedisConfig {
    /// Use Redis rather than the in-process store.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Redis host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Redis port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Logical database index.
    #[serde(default)]
    pub db: u8,
    /// Prefix applied to every key written by this deployment.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Default TTL for cached entries in seconds.
    #[serde(default = "default_ttl")]
    pub default_ttl_seconds: u64,
    /// Capacity of the in-process store.
    #[serde(default = "default_max_capacity")]
    pub memory_max_capacity: u64,
}

impl RedisConfig {
    /// Connection URL for the redis client.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_port(),
            db: 0,
            key_prefix: default_key_prefix(),
            default_ttl_seconds: default_ttl(),
            memory_max_capacity: default_max_capacity(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_key_prefix() -> String {
    String::new()
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    10_000
}
