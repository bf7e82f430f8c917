//! Visibility-filtered job queries.
//!
//! The API only reads jobs and asserts `to_stop`; status changes belong to
//! the worker.

use std::sync::Arc;

use tracing::info;

use rpidrive_auth::PermissionResolver;
use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_entity::job::Job;
use rpidrive_entity::volume::VolumePermission;

use crate::context::RequestContext;

/// Job queries for API callers.
#[derive(Debug, Clone)]
pub struct JobService {
    jobs: Arc<JobRepository>,
    resolver: Arc<PermissionResolver>,
}

impl JobService {
    /// Creates a new job service.
    pub fn new(jobs: Arc<JobRepository>, resolver: Arc<PermissionResolver>) -> Self {
        Self { jobs, resolver }
    }

    /// Jobs on visible volumes; system-wide jobs for superusers only.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Job>> {
        let volume_ids = self.resolver.visible_volume_ids(&ctx.user).await?;
        self.jobs
            .list_visible(&volume_ids, ctx.is_superuser())
            .await
    }

    /// Ask the worker to stop a job at its next checkpoint.
    pub async fn cancel(&self, ctx: &RequestContext, id: i32) -> AppResult<Job> {
        let job = self
            .jobs
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))?;

        match job.volume_id {
            Some(volume_id) => {
                self.resolver
                    .require(&ctx.user, volume_id, VolumePermission::ReadWrite)
                    .await?;
            }
            None if ctx.is_superuser() => {}
            None => return Err(AppError::not_found("Job not found")),
        }

        if job.status.is_terminal() {
            return Err(AppError::invalid_operation(format!(
                "Job already finished with status {}",
                job.status
            )));
        }
        let job = self
            .jobs
            .request_stop(id)
            .await?
            .ok_or_else(|| AppError::invalid_operation("Job already finished"))?;

        info!(user_id = ctx.user_id(), job_id = id, "Job stop requested");
        Ok(job)
    }
}
