//! Key-value store trait shared by the session store, the brute-force
//! counters and the entity cache.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for key-value backends (Redis or in-process).
///
/// Values are strings (JSON for structured data). Implementations are
/// responsible for key prefixing and TTL enforcement.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Set a value with the default TTL.
    async fn set_default(&self, key: &str, value: &str) -> AppResult<()>;

    /// Delete a key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Delete all keys matching a trailing-wildcard pattern (e.g. `"bruteforce.*"`).
    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Increment a counter by one and (re)set its TTL in a single step.
    ///
    /// A missing key starts from zero, so the first call returns 1.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> AppResult<i64>;

    /// Read a counter. Missing or non-numeric values read as zero.
    async fn get_counter(&self, key: &str) -> AppResult<i64> {
        Ok(self
            .get(key)
            .await?
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0))
    }

    /// Get a typed value by deserializing from JSON.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => {
                let parsed = serde_json::from_str(&value)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value by serializing to JSON.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json, ttl).await
    }

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
