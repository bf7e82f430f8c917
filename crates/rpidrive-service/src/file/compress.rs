//! Queueing zip archives.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_entity::job::{CreateJob, Job, JobKind, JobStatus, ZipPayload};
use rpidrive_entity::volume::VolumePermission;
use rpidrive_storage::naming;

use crate::context::RequestContext;

use super::service::FileService;

/// Body of a compress request.
#[derive(Debug, Clone, Deserialize)]
pub struct CompressRequest {
    pub files: Vec<Uuid>,
    pub compress_dir: Uuid,
    pub compress_name: String,
}

/// Sanitized archive name ending in `.zip`.
pub fn archive_name(name: &str) -> AppResult<String> {
    let name = naming::sanitize_name(name)?;
    if name.to_ascii_lowercase().ends_with(".zip") {
        Ok(name)
    } else {
        Ok(format!("{name}.zip"))
    }
}

impl FileService {
    /// Queue a ZIP job; the worker writes the archive into `compress_dir`.
    pub async fn compress(&self, ctx: &RequestContext, req: CompressRequest) -> AppResult<Job> {
        if req.files.is_empty() {
            return Err(AppError::validation("No files to compress"));
        }
        let dir = self
            .load_folder_with(ctx, req.compress_dir, VolumePermission::ReadWrite)
            .await?;
        for id in &req.files {
            let file = self.load_with(ctx, *id, VolumePermission::Read).await?;
            if file.is_root() {
                return Err(AppError::invalid_operation("Cannot compress a volume root"));
            }
        }
        let compress_name = archive_name(&req.compress_name)?;

        let payload = ZipPayload {
            files: req.files,
            compress_dir: dir.id,
            compress_name: compress_name.clone(),
        };
        let job = self
            .jobs
            .create(&CreateJob {
                kind: JobKind::Zip,
                description: format!("Compressing {compress_name}"),
                data: serde_json::to_value(&payload)?,
                status: JobStatus::InQueue,
                volume_id: Some(dir.volume_id),
            })
            .await?;

        info!(user_id = ctx.user_id(), job_id = job.id, name = %compress_name, "Zip job queued");
        Ok(job)
    }
}
