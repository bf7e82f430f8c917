//! Job repository.
//!
//! Status changes are guarded on the expected current status so that a
//! terminal job can never be moved again.

use sqlx::PgPool;
use uuid::Uuid;

use rpidrive_core::result::AppResult;
use rpidrive_entity::job::{CreateJob, Job, JobKind, JobStatus};

use crate::error::db_error;

/// Repository for background jobs.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a job.
    pub async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (kind, description, data, status, volume_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.kind)
        .bind(&data.description)
        .bind(&data.data)
        .bind(data.status)
        .bind(data.volume_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create job", e))
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find job", e))
    }

    /// Jobs on the given volumes, plus system-wide jobs when requested.
    pub async fn list_visible(
        &self,
        volume_ids: &[Uuid],
        include_system: bool,
    ) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs \
             WHERE volume_id = ANY($1) OR ($2 AND volume_id IS NULL) \
             ORDER BY id DESC",
        )
        .bind(volume_ids)
        .bind(include_system)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list jobs", e))
    }

    /// Most recent job of `kind` on a volume.
    pub async fn latest_for_volume(&self, kind: JobKind, volume_id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE kind = $1 AND volume_id = $2 ORDER BY id DESC LIMIT 1",
        )
        .bind(kind)
        .bind(volume_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find latest job", e))
    }

    /// Assert `to_stop` on a non-terminal job. Returns the updated row, or
    /// `None` when the job is already terminal.
    pub async fn request_stop(&self, id: i32) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET to_stop = TRUE, updated_at = NOW() \
             WHERE id = $1 AND status IN ('IN_QUEUE', 'RUNNING') RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to request job stop", e))
    }

    /// Move `id` from `from` to `to`. Returns false if the job was not in `from`.
    pub async fn transition(&self, id: i32, from: JobStatus, to: JobStatus) -> AppResult<bool> {
        if !from.can_transition_to(to) {
            return Ok(false);
        }
        let result = sqlx::query(
            "UPDATE jobs SET status = $3, \
             progress = CASE WHEN $3 = 'DONE'::job_status THEN 100 ELSE progress END, \
             updated_at = NOW() \
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update job status", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Move `id` from `from` to `ERROR`, recording the message.
    pub async fn fail(&self, id: i32, from: JobStatus, message: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'ERROR', error = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from)
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark job failed", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Record progress of a running job.
    pub async fn set_progress(&self, id: i32, progress: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET progress = $2, updated_at = NOW() WHERE id = $1 AND status = 'RUNNING'",
        )
        .bind(id)
        .bind(progress.clamp(0, 100))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update job progress", e))?;
        Ok(())
    }

    /// Whether a stop has been requested for `id`.
    pub async fn stop_requested(&self, id: i32) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT to_stop FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|flag| flag.unwrap_or(true))
            .map_err(|e| db_error("Failed to read job stop flag", e))
    }

    /// Cancel queued jobs of `kind` that were asked to stop before starting.
    pub async fn cancel_stopped_queued(&self, kind: JobKind) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'CANCELLED', updated_at = NOW() \
             WHERE kind = $1 AND status = 'IN_QUEUE' AND to_stop",
        )
        .bind(kind)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to cancel stopped jobs", e))?;
        Ok(result.rows_affected())
    }

    /// Claim the oldest queued job of `kind`, marking it RUNNING.
    pub async fn claim_next(&self, kind: JobKind) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'RUNNING', updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM jobs WHERE kind = $1 AND status = 'IN_QUEUE' AND NOT to_stop \
                 ORDER BY id ASC LIMIT 1 FOR UPDATE SKIP LOCKED \
             ) RETURNING *",
        )
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to claim job", e))
    }
}
