//! Cache manager that dispatches to the configured backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use rpidrive_core::config::RedisConfig;
use rpidrive_core::result::AppResult;
use rpidrive_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &RedisConfig) -> AppResult<Self> {
        if config.enabled {
            #[cfg(feature = "redis-backend")]
            {
                info!(host = %config.host, port = config.port, db = config.db, "Initializing Redis store");
                let client = crate::redis::RedisClient::connect(config).await?;
                let provider =
                    crate::redis::RedisCacheProvider::new(client, config.default_ttl_seconds);
                return Ok(Self::from_provider(Arc::new(provider)));
            }
            #[cfg(not(feature = "redis-backend"))]
            return Err(rpidrive_core::error::AppError::configuration(
                "redis.enabled is true but the redis backend is not compiled in",
            ));
        }
        Self::memory(config)
    }

    /// Create an in-process store.
    pub fn memory(config: &RedisConfig) -> AppResult<Self> {
        #[cfg(feature = "memory")]
        {
            info!("Initializing in-memory store");
            let provider = crate::memory::MemoryCacheProvider::new(
                config.memory_max_capacity,
                config.default_ttl_seconds,
            );
            Ok(Self::from_provider(Arc::new(provider)))
        }
        #[cfg(not(feature = "memory"))]
        {
            let _ = config;
            Err(rpidrive_core::error::AppError::configuration(
                "The in-memory store is not compiled in",
            ))
        }
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn CacheProvider {
        self.inner.as_ref()
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_default(&self, key: &str, value: &str) -> AppResult<()> {
        self.inner.set_default(key, value).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        self.inner.delete_pattern(pattern).await
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        self.inner.incr_with_ttl(key, ttl).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
