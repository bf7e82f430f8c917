//! Activity (audit) repository.

use sqlx::PgPool;

use rpidrive_core::result::AppResult;
use rpidrive_entity::activity::{Activity, ActivityKind};

use crate::error::db_error;

/// Repository for activity entries.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    /// Create a new activity repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    pub async fn create(
        &self,
        actor_id: Option<i32>,
        kind: ActivityKind,
        data: &serde_json::Value,
    ) -> AppResult<Activity> {
        sqlx::query_as::<_, Activity>(
            "INSERT INTO activities (actor_id, kind, data) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(actor_id)
        .bind(kind)
        .bind(data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record activity", e))
    }

    /// Most recent entries first.
    pub async fn list_recent(&self, limit: i64) -> AppResult<Vec<Activity>> {
        sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list activities", e))
    }
}
