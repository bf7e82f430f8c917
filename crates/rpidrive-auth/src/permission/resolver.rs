//! Effective permission resolution.
//!
//! Resolution order:
//! 1. Superuser — implicit ADMIN on every volume.
//! 2. Membership — the `volume_users` row for (user, volume).
//! 3. Otherwise no access.
//!
//! Every file, job and playlist query filters through the helpers here, so
//! a volume the caller cannot see is indistinguishable from a missing one.

use std::sync::Arc;

use uuid::Uuid;

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_entity::user::User;
use rpidrive_entity::volume::{Volume, VolumePermission};

/// Pure resolution rule shared by the resolver and its tests.
pub fn effective_permission(
    is_superuser: bool,
    membership: Option<VolumePermission>,
) -> Option<VolumePermission> {
    if is_superuser {
        return Some(VolumePermission::Admin);
    }
    membership
}

/// Resolves what a user may do on a volume.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    volumes: Arc<VolumeRepository>,
}

impl PermissionResolver {
    /// Creates a resolver over the volume repository.
    pub fn new(volumes: Arc<VolumeRepository>) -> Self {
        Self { volumes }
    }

    /// Effective permission of `user` on `volume_id`, or `None`.
    pub async fn effective(
        &self,
        user: &User,
        volume_id: Uuid,
    ) -> AppResult<Option<VolumePermission>> {
        if user.is_superuser {
            return Ok(Some(VolumePermission::Admin));
        }
        let membership = self.volumes.member_permission(user.id, volume_id).await?;
        Ok(effective_permission(false, membership))
    }

    /// Require at least `min` on the volume.
    ///
    /// A volume the user cannot see at all yields `NotFound`, so that its
    /// existence is not disclosed; a visible volume with too little
    /// permission yields `Authorization`.
    pub async fn require(
        &self,
        user: &User,
        volume_id: Uuid,
        min: VolumePermission,
    ) -> AppResult<VolumePermission> {
        match self.effective(user, volume_id).await? {
            None => Err(AppError::not_found("Volume not found")),
            Some(permission) if permission.has_at_least(min) => Ok(permission),
            Some(_) => Err(AppError::authorization(format!(
                "{} permission required on this volume",
                min.as_str()
            ))),
        }
    }

    /// Volumes on which the user has at least READ.
    pub async fn visible_volumes(&self, user: &User) -> AppResult<Vec<Volume>> {
        self.volumes_at_least(user, VolumePermission::Read).await
    }

    /// Volumes on which the user has at least READ_WRITE.
    pub async fn writable_volumes(&self, user: &User) -> AppResult<Vec<Volume>> {
        self.volumes_at_least(user, VolumePermission::ReadWrite).await
    }

    /// IDs of [`visible_volumes`](Self::visible_volumes).
    pub async fn visible_volume_ids(&self, user: &User) -> AppResult<Vec<Uuid>> {
        Ok(self
            .visible_volumes(user)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect())
    }

    async fn volumes_at_least(&self, user: &User, min: VolumePermission) -> AppResult<Vec<Volume>> {
        if user.is_superuser {
            self.volumes.list_all().await
        } else {
            self.volumes.list_for_member(user.id, min).await
        }
    }
}
