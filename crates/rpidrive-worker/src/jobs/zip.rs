//! Zip archive jobs queued by the compress operation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{error, info, warn};
use uuid::Uuid;

use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_entity::file::{CreateFile, File, FileKind};
use rpidrive_entity::job::{Job, JobKind, JobStatus, ZipPayload};
use rpidrive_entity::volume::Volume;
use rpidrive_service::file::resolve_disk_path;
use rpidrive_storage::archive::{self, ArchiveOutcome, ArchiveSource};
use rpidrive_storage::{fs, media, naming};

/// Suffix of an archive while it is being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Drains queued `ZIP` jobs one at a time.
#[derive(Debug, Clone)]
pub struct ZipJobHandler {
    jobs: Arc<JobRepository>,
    files: Arc<FileRepository>,
    volumes: Arc<VolumeRepository>,
}

impl ZipJobHandler {
    pub fn new(
        jobs: Arc<JobRepository>,
        files: Arc<FileRepository>,
        volumes: Arc<VolumeRepository>,
    ) -> Self {
        Self {
            jobs,
            files,
            volumes,
        }
    }

    /// Process every queued job in id order. Returns how many were run.
    pub async fn run_pending(&self) -> AppResult<usize> {
        let cancelled = self.jobs.cancel_stopped_queued(JobKind::Zip).await?;
        if cancelled > 0 {
            info!(count = cancelled, "Cancelled zip jobs stopped before start");
        }

        let mut processed = 0;
        while let Some(job) = self.jobs.claim_next(JobKind::Zip).await? {
            self.process(&job).await;
            processed += 1;
        }
        Ok(processed)
    }

    /// Run one claimed job and record its final status.
    pub async fn process(&self, job: &Job) {
        info!(job_id = job.id, description = %job.description, "Zip job started");
        let result = match self.execute(job).await {
            Ok(ArchiveOutcome::Completed { bytes }) => {
                info!(job_id = job.id, bytes, "Zip job done");
                self.jobs
                    .transition(job.id, JobStatus::Running, JobStatus::Done)
                    .await
            }
            Ok(ArchiveOutcome::Cancelled) => {
                info!(job_id = job.id, "Zip job cancelled");
                self.jobs
                    .transition(job.id, JobStatus::Running, JobStatus::Cancelled)
                    .await
            }
            Err(e) => {
                error!(job_id = job.id, error = %e, "Zip job failed");
                self.jobs.fail(job.id, JobStatus::Running, &e.message).await
            }
        };
        if let Err(e) = result {
            warn!(job_id = job.id, error = %e, "Failed to record zip job status");
        }
    }

    async fn execute(&self, job: &Job) -> AppResult<ArchiveOutcome> {
        let payload: ZipPayload = job.payload()?;

        let dir = self
            .files
            .find_by_id(payload.compress_dir)
            .await?
            .filter(File::is_folder)
            .ok_or_else(|| AppError::not_found("Target folder no longer exists"))?;
        let dir_volume = self.local_volume(dir.volume_id).await?;
        let dir_path = resolve_disk_path(&self.files, &dir_volume, &dir).await?;

        let mut sources = Vec::with_capacity(payload.files.len());
        for id in &payload.files {
            let file = self
                .files
                .find_by_id(*id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("File {id} no longer exists")))?;
            let volume = if file.volume_id == dir_volume.id {
                dir_volume.clone()
            } else {
                self.local_volume(file.volume_id).await?
            };
            sources.push(ArchiveSource {
                path: resolve_disk_path(&self.files, &volume, &file).await?,
                name: file.name,
            });
        }

        let taken: HashSet<String> = self.files.child_names(dir.id).await?.into_iter().collect();
        let name = naming::unique_name(&payload.compress_name, |candidate| {
            taken.contains(candidate)
                || dir_path.join(candidate).exists()
                || dir_path.join(format!("{candidate}{PARTIAL_SUFFIX}")).exists()
        });
        let partial = dir_path.join(format!("{name}{PARTIAL_SUFFIX}"));

        let bytes = match self.write_archive(job.id, sources, partial.clone()).await {
            Ok(ArchiveOutcome::Completed { bytes }) => bytes,
            Ok(ArchiveOutcome::Cancelled) => {
                fs::remove_path_best_effort(&partial).await;
                return Ok(ArchiveOutcome::Cancelled);
            }
            Err(e) => {
                fs::remove_path_best_effort(&partial).await;
                return Err(e);
            }
        };

        let name = match fs::move_unique(&partial, &dir_path, &name, &taken).await {
            Ok(name) => name,
            Err(e) => {
                fs::remove_path_best_effort(&partial).await;
                return Err(e);
            }
        };
        let stat = fs::stat(&dir_path.join(&name)).await?;
        self.files
            .create(&CreateFile {
                volume_id: dir.volume_id,
                parent_id: Some(dir.id),
                name: name.clone(),
                kind: FileKind::File,
                size: i64::try_from(stat.size).unwrap_or(i64::MAX),
                last_modified: stat.modified,
                media_type: media::media_type(&name),
            })
            .await?;

        Ok(ArchiveOutcome::Completed { bytes })
    }

    /// Write the archive on the blocking pool, reporting progress and
    /// polling the stop flag at every percent boundary.
    async fn write_archive(
        &self,
        job_id: i32,
        sources: Vec<ArchiveSource>,
        dest: PathBuf,
    ) -> AppResult<ArchiveOutcome> {
        let handle = Handle::current();
        let jobs = Arc::clone(&self.jobs);

        tokio::task::spawn_blocking(move || {
            archive::write_zip(&sources, &dest, |percent| {
                if let Err(e) = handle.block_on(jobs.set_progress(job_id, i32::from(percent))) {
                    warn!(job_id, error = %e, "Failed to record zip progress");
                }
                match handle.block_on(jobs.stop_requested(job_id)) {
                    Ok(stop) => !stop,
                    Err(e) => {
                        warn!(job_id, error = %e, "Failed to read stop flag");
                        true
                    }
                }
            })
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Zip task panicked", e))?
    }

    async fn local_volume(&self, id: Uuid) -> AppResult<Volume> {
        let volume = self
            .volumes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Volume not found"))?;
        if !volume.kind.is_local() {
            return Err(AppError::invalid_operation(format!(
                "Volume '{}' is not stored on this host",
                volume.name
            )));
        }
        Ok(volume)
    }
}
