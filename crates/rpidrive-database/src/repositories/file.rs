//! File tree repository.
//!
//! Methods suffixed with `_in` run on a caller-provided connection so that
//! multi-row operations (move, subtree delete, folder reconciliation) can
//! share one transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use rpidrive_core::result::AppResult;
use rpidrive_entity::file::{CreateFile, File, FileRef};

use crate::error::db_error;

/// Repository for file CRUD and tree queries.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a transaction on the underlying pool.
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find file", e))
    }

    /// Find several files by ID, in no particular order.
    pub async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find files", e))
    }

    /// Find the root folder of a volume.
    pub async fn find_root(&self, volume_id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE volume_id = $1 AND parent_id IS NULL",
        )
        .bind(volume_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find volume root", e))
    }

    /// Find a child of `parent_id` by exact name.
    pub async fn find_child(&self, parent_id: Uuid, name: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE parent_id = $1 AND name = $2")
            .bind(parent_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find child file", e))
    }

    /// Immediate children, folders first then by name.
    pub async fn children(&self, parent_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE parent_id = $1 ORDER BY kind ASC, name ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list children", e))
    }

    /// Names of the immediate children of a folder.
    pub async fn child_names(&self, parent_id: Uuid) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM files WHERE parent_id = $1")
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list child names", e))
    }

    /// Ancestor chain from the volume root down to the direct parent.
    ///
    /// The file itself is not included; the root yields an empty chain.
    pub async fn ancestors(&self, id: Uuid) -> AppResult<Vec<FileRef>> {
        sqlx::query_as::<_, FileRef>(
            "WITH RECURSIVE chain AS ( \
                 SELECT p.id, p.parent_id, p.name, 0 AS depth \
                 FROM files f JOIN files p ON p.id = f.parent_id WHERE f.id = $1 \
                 UNION ALL \
                 SELECT f.id, f.parent_id, f.name, c.depth + 1 \
                 FROM files f JOIN chain c ON f.id = c.parent_id \
             ) \
             SELECT id, name FROM chain ORDER BY depth DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to resolve ancestors", e))
    }

    /// Whether `candidate` is `ancestor` itself or lies below it.
    pub async fn is_within(&self, candidate: Uuid, ancestor: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "WITH RECURSIVE chain AS ( \
                 SELECT id, parent_id FROM files WHERE id = $1 \
                 UNION ALL \
                 SELECT f.id, f.parent_id FROM files f JOIN chain c ON f.id = c.parent_id \
             ) \
             SELECT EXISTS (SELECT 1 FROM chain WHERE id = $2)",
        )
        .bind(candidate)
        .bind(ancestor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to check ancestry", e))
    }

    /// Case-insensitive substring search over the given volumes.
    pub async fn search(
        &self,
        keyword: &str,
        volume_ids: &[Uuid],
        limit: i64,
    ) -> AppResult<Vec<File>> {
        let pattern = format!("%{}%", escape_like(keyword));
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE volume_id = ANY($1) AND parent_id IS NOT NULL \
             AND name ILIKE $2 ESCAPE '\\' \
             ORDER BY kind ASC, name ASC LIMIT $3",
        )
        .bind(volume_ids)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to search files", e))
    }

    /// Insert a new file row.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        Self::insert_in(&mut conn, data).await
    }

    /// Insert a new file row on the given connection.
    pub async fn insert_in(conn: &mut PgConnection, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, volume_id, parent_id, name, kind, size, last_modified, media_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.volume_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(data.kind)
        .bind(data.size)
        .bind(data.last_modified)
        .bind(&data.media_type)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to create file", e))
    }

    /// Insert, or refresh the existing row with the same `(volume, parent, name)`.
    pub async fn upsert_in(conn: &mut PgConnection, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, volume_id, parent_id, name, kind, size, last_modified, media_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT ON CONSTRAINT files_unique_name DO UPDATE SET \
             kind = EXCLUDED.kind, size = EXCLUDED.size, \
             last_modified = EXCLUDED.last_modified, media_type = EXCLUDED.media_type \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.volume_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(data.kind)
        .bind(data.size)
        .bind(data.last_modified)
        .bind(&data.media_type)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to upsert file", e))
    }

    /// Refresh size and modification time of an existing row.
    pub async fn update_stat_in(
        conn: &mut PgConnection,
        id: Uuid,
        size: i64,
        last_modified: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE files SET size = $2, last_modified = $3 WHERE id = $1")
            .bind(id)
            .bind(size)
            .bind(last_modified)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to update file stat", e))?;
        Ok(())
    }

    /// Lock a row for the rest of the transaction.
    pub async fn lock_in(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to lock file", e))
    }

    /// Lock the child rows of a folder for the rest of the transaction.
    pub async fn lock_children_in(conn: &mut PgConnection, parent_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE parent_id = $1 FOR UPDATE")
            .bind(parent_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to lock children", e))
    }

    /// Lock the same-named sibling under `parent_id`, if present.
    pub async fn lock_child_in(
        conn: &mut PgConnection,
        parent_id: Uuid,
        name: &str,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE parent_id = $1 AND name = $2 FOR UPDATE",
        )
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to lock child file", e))
    }

    /// Rename a row in place.
    pub async fn rename_in(conn: &mut PgConnection, id: Uuid, name: &str) -> AppResult<()> {
        sqlx::query("UPDATE files SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to rename file", e))?;
        Ok(())
    }

    /// Re-parent a row, carrying its subtree into `volume_id` when it changes.
    pub async fn move_in(
        conn: &mut PgConnection,
        id: Uuid,
        parent_id: Uuid,
        volume_id: Uuid,
        name: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "WITH RECURSIVE subtree AS ( \
                 SELECT id FROM files WHERE id = $1 \
                 UNION ALL \
                 SELECT f.id FROM files f JOIN subtree s ON f.parent_id = s.id \
             ) \
             UPDATE files SET volume_id = $2 \
             WHERE id IN (SELECT id FROM subtree) AND volume_id <> $2",
        )
        .bind(id)
        .bind(volume_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to move subtree across volumes", e))?;

        sqlx::query("UPDATE files SET parent_id = $2, name = $3 WHERE id = $1")
            .bind(id)
            .bind(parent_id)
            .bind(name)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to move file", e))?;
        Ok(())
    }

    /// Delete a row; descendants, links and playlist entries cascade.
    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a row outside of any transaction.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        Self::delete_in(&mut conn, id).await
    }

    /// Delete the children of `parent_id` whose IDs are listed.
    pub async fn delete_children_in(
        conn: &mut PgConnection,
        parent_id: Uuid,
        ids: &[Uuid],
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM files WHERE parent_id = $1 AND id = ANY($2)")
            .bind(parent_id)
            .bind(ids)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to delete stale files", e))?;
        Ok(result.rows_affected())
    }
}

/// Escape `LIKE` wildcards so the keyword matches literally.
fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
