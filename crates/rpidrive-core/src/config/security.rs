//! Brute-force guard, cookie domain and reverse-proxy configuration.

use serde::{Deserialize, Serialize};

/// `security.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityConfig {
    /// Enables the login brute-force guard.
    #[serde(default = "default_block_spam")]
    pub block_spam: bool,
    /// Failed attempts before an address is blocked.
    #[serde(default = "default_block_trigger")]
    pub block_trigger: u32,
    /// Block duration in seconds; also the failure counter's TTL.
    #[serde(default = "default_block_duration")]
    pub block_duration: u64,
    /// Cookie domain for the session cookie.
    #[serde(default)]
    pub domain: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            block_spam: default_block_spam(),
            block_trigger: default_block_trigger(),
            block_duration: default_block_duration(),
            domain: None,
        }
    }
}

/// `reverse-proxy.*` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReverseProxyConfig {
    /// Header carrying the original client address (e.g. `X-Forwarded-For`).
    #[serde(default)]
    pub ip_header: Option<String>,
}

fn default_block_spam() -> bool {
    true
}

fn default_block_trigger() -> u32 {
    5
}

fn default_block_duration() -> u64 {
    600
}
