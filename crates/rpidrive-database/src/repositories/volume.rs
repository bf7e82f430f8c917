//! Volume and volume-membership repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use rpidrive_core::result::AppResult;
use rpidrive_entity::file::{CreateFile, File};
use rpidrive_entity::volume::{CreateVolume, Volume, VolumePermission, VolumeUser};

use super::file::FileRepository;
use crate::error::db_error;

/// Repository for volumes and their member users.
#[derive(Debug, Clone)]
pub struct VolumeRepository {
    pool: PgPool,
}

impl VolumeRepository {
    /// Create a new volume repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a volume by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Volume>> {
        sqlx::query_as::<_, Volume>("SELECT * FROM volumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find volume", e))
    }

    /// Find a volume by its unique name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Volume>> {
        sqlx::query_as::<_, Volume>("SELECT * FROM volumes WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find volume by name", e))
    }

    /// List every volume ordered by name.
    pub async fn list_all(&self) -> AppResult<Vec<Volume>> {
        sqlx::query_as::<_, Volume>("SELECT * FROM volumes ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list volumes", e))
    }

    /// List volumes on which `user_id` holds at least `min` permission.
    pub async fn list_for_member(
        &self,
        user_id: i32,
        min: VolumePermission,
    ) -> AppResult<Vec<Volume>> {
        sqlx::query_as::<_, Volume>(
            "SELECT v.* FROM volumes v \
             JOIN volume_users vu ON vu.volume_id = v.id \
             WHERE vu.user_id = $1 AND vu.permission >= $2 \
             ORDER BY v.name ASC",
        )
        .bind(user_id)
        .bind(min)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list member volumes", e))
    }

    /// Insert a volume together with its root folder in one transaction.
    pub async fn create_with_root(&self, data: &CreateVolume) -> AppResult<(Volume, File)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let volume = sqlx::query_as::<_, Volume>(
            "INSERT INTO volumes (id, name, kind, path, indexing) \
             VALUES ($1, $2, $3, $4, TRUE) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(data.kind)
        .bind(&data.path)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to create volume", e))?;

        let root = FileRepository::insert_in(&mut *tx, &CreateFile::root(volume.id)).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit volume creation", e))?;
        Ok((volume, root))
    }

    /// Update name and/or path. A new path requests an indexing pass.
    /// Returns `None` when the volume does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        path: Option<&str>,
    ) -> AppResult<Option<Volume>> {
        sqlx::query_as::<_, Volume>(
            "UPDATE volumes SET name = COALESCE($2, name), path = COALESCE($3, path), \
                 indexing = indexing OR ($3 IS NOT NULL AND $3 <> path) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update volume", e))
    }

    /// Delete a volume; files cascade.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM volumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete volume", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Request (or withdraw) an indexing pass.
    pub async fn set_indexing(&self, id: Uuid, indexing: bool) -> AppResult<()> {
        sqlx::query("UPDATE volumes SET indexing = $2 WHERE id = $1")
            .bind(id)
            .bind(indexing)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to flag volume for indexing", e))?;
        Ok(())
    }

    /// Record a completed indexing pass. The `indexing` flag is left alone;
    /// the pass consumed the request it served when it started.
    pub async fn mark_indexed(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE volumes SET last_indexed = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to mark volume indexed", e))?;
        Ok(())
    }

    /// The permission row for `(user, volume)`, if any.
    pub async fn member_permission(
        &self,
        user_id: i32,
        volume_id: Uuid,
    ) -> AppResult<Option<VolumePermission>> {
        sqlx::query_scalar::<_, VolumePermission>(
            "SELECT permission FROM volume_users WHERE user_id = $1 AND volume_id = $2",
        )
        .bind(user_id)
        .bind(volume_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read volume permission", e))
    }

    /// Every membership row of a user.
    pub async fn memberships_of(&self, user_id: i32) -> AppResult<Vec<VolumeUser>> {
        sqlx::query_as::<_, VolumeUser>("SELECT * FROM volume_users WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list memberships", e))
    }

    /// Every member of a volume.
    pub async fn members(&self, volume_id: Uuid) -> AppResult<Vec<VolumeUser>> {
        sqlx::query_as::<_, VolumeUser>(
            "SELECT * FROM volume_users WHERE volume_id = $1 ORDER BY user_id ASC",
        )
        .bind(volume_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list volume members", e))
    }

    /// Replace the member set of a volume atomically.
    pub async fn replace_members(
        &self,
        volume_id: Uuid,
        members: &[(i32, VolumePermission)],
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        sqlx::query("DELETE FROM volume_users WHERE volume_id = $1")
            .bind(volume_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to clear volume members", e))?;

        for (user_id, permission) in members {
            sqlx::query(
                "INSERT INTO volume_users (user_id, volume_id, permission) VALUES ($1, $2, $3)",
            )
            .bind(user_id)
            .bind(volume_id)
            .bind(permission)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to add volume member", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit volume members", e))?;
        Ok(())
    }

    /// Grant or change a single membership.
    pub async fn upsert_member(
        &self,
        volume_id: Uuid,
        user_id: i32,
        permission: VolumePermission,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO volume_users (user_id, volume_id, permission) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, volume_id) DO UPDATE SET permission = EXCLUDED.permission",
        )
        .bind(user_id)
        .bind(volume_id)
        .bind(permission)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to set volume member", e))?;
        Ok(())
    }
}
