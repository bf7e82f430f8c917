//! Read-through cache of entity rows keyed by type and primary key.
//!
//! Callers read with [`EntityCache::get`], fall back to the database on a
//! miss, then [`EntityCache::set`]. Every update or delete of a cached row
//! must call [`EntityCache::delete`].

use std::fmt::Display;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use rpidrive_core::result::AppResult;
use rpidrive_core::traits::cache::CacheProvider;
use rpidrive_entity::user::User;
use rpidrive_entity::volume::Volume;

use crate::keys;
use crate::provider::CacheManager;

/// Default lifetime of a cached row.
pub const ENTITY_TTL: Duration = Duration::from_secs(300);

/// An entity that can be stored in the [`EntityCache`].
pub trait CachedEntity: Serialize + DeserializeOwned + Send + Sync {
    /// Primary key type.
    type Key: Display + Send + Sync;

    /// Entity name used in the key.
    const NAME: &'static str;

    /// Primary key of this row.
    fn primary_key(&self) -> Self::Key;
}

impl CachedEntity for User {
    type Key = i32;
    const NAME: &'static str = "user";

    fn primary_key(&self) -> i32 {
        self.id
    }
}

impl CachedEntity for Volume {
    type Key = Uuid;
    const NAME: &'static str = "volume";

    fn primary_key(&self) -> Uuid {
        self.id
    }
}

/// Entity cache over the shared key-value store.
#[derive(Debug, Clone)]
pub struct EntityCache {
    cache: CacheManager,
    ttl: Duration,
}

impl EntityCache {
    /// Create an entity cache with the default TTL.
    pub fn new(cache: CacheManager) -> Self {
        Self::with_ttl(cache, ENTITY_TTL)
    }

    /// Create an entity cache with a custom TTL.
    pub fn with_ttl(cache: CacheManager, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Cached row, if present. Undecodable entries are dropped and read as a miss.
    pub async fn get<T: CachedEntity>(&self, pk: T::Key) -> AppResult<Option<T>> {
        let key = keys::entity(T::NAME, pk);
        match self.cache.get_json::<T>(&key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                self.cache.delete(&key).await?;
                Ok(None)
            }
        }
    }

    /// Store a row.
    pub async fn set<T: CachedEntity>(&self, entity: &T) -> AppResult<()> {
        let key = keys::entity(T::NAME, entity.primary_key());
        self.cache.set_json(&key, entity, self.ttl).await
    }

    /// Invalidate a row.
    pub async fn delete<T: CachedEntity>(&self, pk: T::Key) -> AppResult<()> {
        self.cache.delete(&keys::entity(T::NAME, pk)).await
    }

    /// Whether a row is cached.
    pub async fn has<T: CachedEntity>(&self, pk: T::Key) -> AppResult<bool> {
        self.cache.exists(&keys::entity(T::NAME, pk)).await
    }
}
