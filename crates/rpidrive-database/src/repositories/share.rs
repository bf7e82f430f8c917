//! Public file link repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use rpidrive_core::result::AppResult;
use rpidrive_entity::share::PublicFileLink;

use crate::error::db_error;

/// Repository for public file links.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    /// Create a new share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a link to `file_id` expiring at `expire_time`.
    pub async fn create(
        &self,
        file_id: Uuid,
        expire_time: DateTime<Utc>,
    ) -> AppResult<PublicFileLink> {
        sqlx::query_as::<_, PublicFileLink>(
            "INSERT INTO public_file_links (id, file_id, expire_time) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(file_id)
        .bind(expire_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create public link", e))
    }

    /// Find a link that is still valid at `now`.
    pub async fn find_valid(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PublicFileLink>> {
        sqlx::query_as::<_, PublicFileLink>(
            "SELECT * FROM public_file_links WHERE id = $1 AND expire_time > $2",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find public link", e))
    }

    /// Find a link regardless of expiry.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<PublicFileLink>> {
        sqlx::query_as::<_, PublicFileLink>("SELECT * FROM public_file_links WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find public link", e))
    }

    /// Delete every link with `expire_time <= now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM public_file_links WHERE expire_time <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete expired links", e))?;
        Ok(result.rows_affected())
    }
}
