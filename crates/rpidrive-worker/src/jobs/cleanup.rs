//! Removal of expired public links.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::share::ShareRepository;

/// Deletes public links whose expiry has passed.
#[derive(Debug, Clone)]
pub struct LinkCleanup {
    shares: Arc<ShareRepository>,
}

impl LinkCleanup {
    pub fn new(shares: Arc<ShareRepository>) -> Self {
        Self { shares }
    }

    /// Delete every link with `expire_time <= now`.
    pub async fn run(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let removed = self.shares.delete_expired(now).await?;
        if removed > 0 {
            info!(count = removed, "Removed expired public links");
        }
        Ok(removed)
    }
}
