//! Playlist repository.

use sqlx::PgPool;
use uuid::Uuid;

use rpidrive_core::result::AppResult;
use rpidrive_entity::file::File;
use rpidrive_entity::playlist::Playlist;

use crate::error::db_error;

/// Repository for playlists and their ordered members.
#[derive(Debug, Clone)]
pub struct PlaylistRepository {
    pool: PgPool,
}

impl PlaylistRepository {
    /// Create a new playlist repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Playlists owned by `owner_id`.
    pub async fn list_for_owner(&self, owner_id: i32) -> AppResult<Vec<Playlist>> {
        sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = $1 ORDER BY name ASC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list playlists", e))
    }

    /// A playlist, only if owned by `owner_id`.
    pub async fn find_for_owner(&self, id: i32, owner_id: i32) -> AppResult<Option<Playlist>> {
        sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find playlist", e))
    }

    /// Create a playlist.
    pub async fn create(&self, owner_id: i32, name: &str) -> AppResult<Playlist> {
        sqlx::query_as::<_, Playlist>(
            "INSERT INTO playlists (owner_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create playlist", e))
    }

    /// Rename a playlist.
    pub async fn rename(&self, id: i32, name: &str) -> AppResult<()> {
        sqlx::query("UPDATE playlists SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to rename playlist", e))?;
        Ok(())
    }

    /// Delete a playlist and its membership rows.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete playlist", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Member files in sequence order.
    pub async fn files(&self, id: i32) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT f.* FROM playlist_files pf JOIN files f ON f.id = pf.file_id \
             WHERE pf.playlist_id = $1 ORDER BY pf.sequence ASC, pf.id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list playlist files", e))
    }

    /// Member file IDs in sequence order.
    pub async fn file_ids(&self, id: i32) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT file_id FROM playlist_files WHERE playlist_id = $1 \
             ORDER BY sequence ASC, id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list playlist members", e))
    }

    /// Append a file after the current last member.
    pub async fn add_file(&self, id: i32, file_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO playlist_files (playlist_id, file_id, sequence) \
             SELECT $1, $2, COALESCE(MAX(sequence) + 1, 0) FROM playlist_files WHERE playlist_id = $1",
        )
        .bind(id)
        .bind(file_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to add playlist file", e))?;
        Ok(())
    }

    /// Remove a file. Returns whether it was a member.
    pub async fn remove_file(&self, id: i32, file_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM playlist_files WHERE playlist_id = $1 AND file_id = $2")
                .bind(id)
                .bind(file_id)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to remove playlist file", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Assign sequences `0..n` following `order`.
    pub async fn reorder(&self, id: i32, order: &[Uuid]) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        for (sequence, file_id) in order.iter().enumerate() {
            let sequence = i32::try_from(sequence).unwrap_or(i32::MAX);
            sqlx::query(
                "UPDATE playlist_files SET sequence = $3 WHERE playlist_id = $1 AND file_id = $2",
            )
            .bind(id)
            .bind(file_id)
            .bind(sequence)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to reorder playlist", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit playlist order", e))?;
        Ok(())
    }
}
