//! Cached reads of users and volumes.
//!
//! Every service that mutates one of these rows calls the matching
//! `forget_*` afterwards so the next read goes to the database.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use rpidrive_cache::EntityCache;
use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::user::UserRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_entity::user::User;
use rpidrive_entity::volume::Volume;

/// Read-through lookup of users and volumes.
#[derive(Debug, Clone)]
pub struct EntityLookup {
    users: Arc<UserRepository>,
    volumes: Arc<VolumeRepository>,
    cache: EntityCache,
}

impl EntityLookup {
    /// Creates a new lookup.
    pub fn new(
        users: Arc<UserRepository>,
        volumes: Arc<VolumeRepository>,
        cache: EntityCache,
    ) -> Self {
        Self {
            users,
            volumes,
            cache,
        }
    }

    /// A user by ID, or `None`.
    ///
    /// The cached copy carries no password hash; read the repository when
    /// the hash is needed.
    pub async fn user(&self, id: i32) -> AppResult<Option<User>> {
        if let Some(user) = self.cache.get::<User>(id).await.unwrap_or_else(|e| {
            warn!(user_id = id, error = %e, "Entity cache read failed");
            None
        }) {
            return Ok(Some(user));
        }
        let user = self.users.find_by_id(id).await?;
        if let Some(user) = &user {
            self.store(user).await;
        }
        Ok(user)
    }

    /// A volume by ID, or `None`.
    pub async fn volume(&self, id: Uuid) -> AppResult<Option<Volume>> {
        if let Some(volume) = self.cache.get::<Volume>(id).await.unwrap_or_else(|e| {
            warn!(volume_id = %id, error = %e, "Entity cache read failed");
            None
        }) {
            return Ok(Some(volume));
        }
        let volume = self.volumes.find_by_id(id).await?;
        if let Some(volume) = &volume {
            self.store(volume).await;
        }
        Ok(volume)
    }

    /// A volume by ID, failing with `NotFound`.
    pub async fn require_volume(&self, id: Uuid) -> AppResult<Volume> {
        self.volume(id)
            .await?
            .ok_or_else(|| AppError::not_found("Volume not found"))
    }

    /// Drop the cached user.
    pub async fn forget_user(&self, id: i32) {
        if let Err(e) = self.cache.delete::<User>(id).await {
            warn!(user_id = id, error = %e, "Failed to invalidate cached user");
        }
    }

    /// Drop the cached volume.
    pub async fn forget_volume(&self, id: Uuid) {
        if let Err(e) = self.cache.delete::<Volume>(id).await {
            warn!(volume_id = %id, error = %e, "Failed to invalidate cached volume");
        }
    }

    async fn store<T: rpidrive_cache::CachedEntity>(&self, entity: &T) {
        if let Err(e) = self.cache.set(entity).await {
            warn!(entity = T::NAME, error = %e, "Entity cache write failed");
        }
    }
}
