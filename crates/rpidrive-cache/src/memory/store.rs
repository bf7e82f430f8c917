//! In-memory store implementation using the moka crate.
//!
//! Each entry carries its own TTL through a moka [`Expiry`] policy, so
//! counters and sessions expire independently of each other.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use rpidrive_core::result::AppResult;
use rpidrive_core::traits::cache::CacheProvider;

/// A stored value with the TTL it was written with.
#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// Expiry policy reading the TTL from the entry itself.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory store provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache.
    cache: Cache<String, CachedValue>,
    /// Default TTL for entries.
    default_ttl: Duration,
}

impl MemoryCacheProvider {
    /// Create a new in-memory store.
    pub fn new(max_capacity: u64, default_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(
                key.to_string(),
                CachedValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn set_default(&self, key: &str, value: &str) -> AppResult<()> {
        self.set(key, value, self.default_ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.get(key).await.is_some())
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        // Only trailing wildcards are supported.
        let prefix = pattern.trim_end_matches('*');
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.to_string())
            .collect();

        let count = keys.len() as u64;
        for key in keys {
            self.cache.invalidate(&key).await;
        }

        debug!(pattern, count, "Deleted keys matching pattern");
        Ok(count)
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let entry = self
            .cache
            .entry(key.to_string())
            .and_upsert_with(|existing| {
                let current = existing
                    .and_then(|entry| entry.into_value().value.parse::<i64>().ok())
                    .unwrap_or(0);
                std::future::ready(CachedValue {
                    value: current.saturating_add(1).to_string(),
                    ttl,
                })
            })
            .await;
        Ok(entry.into_value().value.parse::<i64>().unwrap_or(1))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
