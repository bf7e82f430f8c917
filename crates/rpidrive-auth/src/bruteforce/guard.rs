//! Failed-login counter keyed by client address.
//!
//! The counter `bruteforce.<ip>` lives in the shared store with a TTL of
//! `block-duration`. Every failure increments it and refreshes the TTL;
//! a successful login deletes it. Once it reaches `block-trigger` the login
//! handler is no longer invoked for that address.

use std::time::Duration;

use tracing::{info, warn};

use rpidrive_cache::CacheManager;
use rpidrive_cache::keys;
use rpidrive_core::config::SecurityConfig;
use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_core::traits::cache::CacheProvider;

/// Message returned to blocked clients.
pub const BLOCKED_MESSAGE: &str = "Request blocked temporarily due to too many failed attempts!";

/// Brute-force guard for the login endpoint.
#[derive(Debug, Clone)]
pub struct BruteForceGuard {
    cache: CacheManager,
    enabled: bool,
    trigger: i64,
    duration: Duration,
}

impl BruteForceGuard {
    /// Creates a guard from the `security.*` section.
    pub fn new(cache: CacheManager, config: &SecurityConfig) -> Self {
        Self {
            cache,
            enabled: config.block_spam,
            trigger: i64::from(config.block_trigger),
            duration: Duration::from_secs(config.block_duration),
        }
    }

    /// Whether the guard is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fails with `Blocked` when `ip` has reached the trigger.
    pub async fn check(&self, ip: &str) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let failures = self.cache.get_counter(&keys::bruteforce(ip)).await?;
        if failures >= self.trigger {
            warn!(ip, failures, "Blocked login attempt");
            return Err(AppError::blocked(BLOCKED_MESSAGE));
        }
        Ok(())
    }

    /// Clear the counter after a successful login.
    pub async fn record_success(&self, ip: &str) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.cache.delete(&keys::bruteforce(ip)).await
    }

    /// Count a failed login, returning the new counter value.
    pub async fn record_failure(&self, ip: &str) -> AppResult<i64> {
        if !self.enabled {
            return Ok(0);
        }
        let failures = self
            .cache
            .incr_with_ttl(&keys::bruteforce(ip), self.duration)
            .await?;
        if failures == self.trigger {
            warn!(ip, failures, "Address blocked after repeated login failures");
        }
        Ok(failures)
    }

    /// Delete every counter. Returns how many were removed.
    pub async fn reset_all(&self) -> AppResult<u64> {
        let removed = self.cache.delete_pattern(keys::BRUTEFORCE_PATTERN).await?;
        info!(removed, "Brute-force counters reset");
        Ok(removed)
    }
}
