//! Volume indexer.
//!
//! Reconciles the file rows of a `HOST_PATH` volume with its directory on
//! disk. The disk is authoritative. Each folder is reconciled in its own
//! transaction so that user operations running alongside only ever wait on
//! one folder at a time.

pub mod plan;
pub mod scan;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;
use rpidrive_database::error::db_error;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_entity::file::{CreateFile, FileKind};
use rpidrive_entity::job::{CreateJob, IndexPayload, Job, JobKind, JobStatus};
use rpidrive_entity::volume::Volume;
use rpidrive_storage::media;

pub use plan::{FolderPlan, plan_folder};
pub use scan::{DiskEntry, ScanError};

/// Row counts touched by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub folders: u64,
    pub inserted: u64,
    pub updated: u64,
    pub removed: u64,
    pub skipped: u64,
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Completed(IndexStats),
    Cancelled,
}

struct Folder {
    id: Uuid,
    path: PathBuf,
}

/// Walks volumes and reconciles their file rows.
#[derive(Debug, Clone)]
pub struct Indexer {
    files: Arc<FileRepository>,
    volumes: Arc<VolumeRepository>,
    jobs: Arc<JobRepository>,
}

impl Indexer {
    pub fn new(
        files: Arc<FileRepository>,
        volumes: Arc<VolumeRepository>,
        jobs: Arc<JobRepository>,
    ) -> Self {
        Self {
            files,
            volumes,
            jobs,
        }
    }

    /// Index every local volume that is due at `now`. A failing volume is
    /// logged and does not stop the others; it is retried one period after
    /// the failure, or sooner when indexing is requested again.
    pub async fn index_due(&self, now: DateTime<Utc>, period_minutes: u64) -> AppResult<usize> {
        let volumes = self.volumes.list_all().await?;

        let mut indexed = 0;
        for volume in &volumes {
            match self.index_if_due(volume, now, period_minutes).await {
                Ok(Some(IndexOutcome::Completed(_))) => indexed += 1,
                Ok(_) => {}
                Err(e) => {
                    error!(volume_id = %volume.id, volume = %volume.name, error = %e, "Indexing failed");
                }
            }
        }
        Ok(indexed)
    }

    /// Index `volume` when it is due and not held off by a recent failure.
    /// Returns `None` when no pass was run.
    pub async fn index_if_due(
        &self,
        volume: &Volume,
        now: DateTime<Utc>,
        period_minutes: u64,
    ) -> AppResult<Option<IndexOutcome>> {
        if !volume.needs_indexing(now, period_minutes) {
            return Ok(None);
        }
        let last = self.jobs.latest_for_volume(JobKind::Index, volume.id).await?;
        if retry_held_off(last.as_ref(), volume.indexing, now, period_minutes) {
            debug!(volume_id = %volume.id, volume = %volume.name, "Last pass failed recently, not retrying yet");
            return Ok(None);
        }
        self.index_volume(volume).await.map(Some)
    }

    /// Run one pass over `volume`, tracked by a fresh `INDEX` job.
    pub async fn index_volume(&self, volume: &Volume) -> AppResult<IndexOutcome> {
        if !volume.kind.is_local() {
            return Err(AppError::invalid_operation(format!(
                "Volume '{}' is not stored on this host",
                volume.name
            )));
        }

        let job = self
            .jobs
            .create(&CreateJob {
                kind: JobKind::Index,
                description: format!("Indexing {}", volume.name),
                data: serde_json::to_value(IndexPayload {
                    volume_id: volume.id,
                })?,
                status: JobStatus::Running,
                volume_id: Some(volume.id),
            })
            .await?;

        // requests arriving from here on ask for another pass
        self.volumes.set_indexing(volume.id, false).await?;
        info!(volume_id = %volume.id, volume = %volume.name, job_id = job.id, "Indexing started");

        match self.walk(volume, job.id).await {
            Ok(IndexOutcome::Completed(stats)) => {
                self.volumes.mark_indexed(volume.id, Utc::now()).await?;
                self.jobs
                    .transition(job.id, JobStatus::Running, JobStatus::Done)
                    .await?;
                info!(
                    volume_id = %volume.id,
                    folders = stats.folders,
                    inserted = stats.inserted,
                    updated = stats.updated,
                    removed = stats.removed,
                    skipped = stats.skipped,
                    "Volume indexed"
                );
                Ok(IndexOutcome::Completed(stats))
            }
            Ok(IndexOutcome::Cancelled) => {
                self.jobs
                    .transition(job.id, JobStatus::Running, JobStatus::Cancelled)
                    .await?;
                info!(volume_id = %volume.id, job_id = job.id, "Indexing cancelled");
                Ok(IndexOutcome::Cancelled)
            }
            Err(e) => {
                if let Err(mark) = self.jobs.fail(job.id, JobStatus::Running, &e.message).await {
                    warn!(job_id = job.id, error = %mark, "Failed to record indexing failure");
                }
                Err(e)
            }
        }
    }

    async fn walk(&self, volume: &Volume, job_id: i32) -> AppResult<IndexOutcome> {
        let root = self
            .files
            .find_root(volume.id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Volume '{}' has no root", volume.name)))?;
        let root_path = PathBuf::from(&volume.path);

        let entries = scan::read_dir_async(root_path.clone())
            .await
            .map_err(|e| scan_failure(&root_path, e))?;

        let mut stats = IndexStats::default();
        let top = self
            .reconcile(volume.id, &Folder { id: root.id, path: root_path }, entries, &mut stats)
            .await?;

        let total = top.len();
        for (done, folder) in top.into_iter().enumerate() {
            if self.jobs.stop_requested(job_id).await? {
                return Ok(IndexOutcome::Cancelled);
            }
            self.walk_subtree(volume.id, folder, &mut stats).await?;
            let percent = (done + 1) * 100 / total;
            self.jobs.set_progress(job_id, percent as i32).await?;
        }
        Ok(IndexOutcome::Completed(stats))
    }

    async fn walk_subtree(
        &self,
        volume_id: Uuid,
        start: Folder,
        stats: &mut IndexStats,
    ) -> AppResult<()> {
        let mut pending = vec![start];
        while let Some(folder) = pending.pop() {
            let entries = match scan::read_dir_async(folder.path.clone()).await {
                Ok(entries) => entries,
                Err(ScanError::Denied(e)) => {
                    warn!(path = %folder.path.display(), error = %e, "Folder not readable, leaving it untouched");
                    stats.skipped += 1;
                    continue;
                }
                Err(ScanError::Vanished) => {
                    debug!(path = %folder.path.display(), "Folder vanished during indexing");
                    continue;
                }
                Err(e) => return Err(scan_failure(&folder.path, e)),
            };
            let children = self.reconcile(volume_id, &folder, entries, stats).await?;
            pending.extend(children);
        }
        Ok(())
    }

    /// Apply one folder's plan in a transaction and return its subfolders.
    async fn reconcile(
        &self,
        volume_id: Uuid,
        folder: &Folder,
        entries: Vec<DiskEntry>,
        stats: &mut IndexStats,
    ) -> AppResult<Vec<Folder>> {
        let mut tx = self.files.begin().await?;
        let existing = FileRepository::lock_children_in(&mut tx, folder.id).await?;
        let plan = plan_folder(&existing, &entries);

        let mut subfolders: Vec<Folder> = plan
            .keep_folders
            .iter()
            .map(|(id, name)| Folder {
                id: *id,
                path: folder.path.join(name),
            })
            .collect();

        stats.removed += FileRepository::delete_children_in(&mut tx, folder.id, &plan.deletions()).await?;

        for (id, entry) in &plan.update {
            FileRepository::update_stat_in(&mut tx, *id, size_of(entry), entry.stat.modified).await?;
            stats.updated += 1;
        }

        let fresh = plan
            .insert
            .iter()
            .chain(plan.replace.iter().map(|(_, entry)| entry));
        for entry in fresh {
            let row = FileRepository::upsert_in(&mut tx, &new_row(volume_id, folder.id, entry)).await?;
            if row.is_folder() {
                subfolders.push(Folder {
                    id: row.id,
                    path: folder.path.join(&row.name),
                });
            }
            stats.inserted += 1;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit folder reconciliation", e))?;

        stats.folders += 1;
        if !plan.is_empty() {
            debug!(path = %folder.path.display(), "Folder reconciled");
        }
        Ok(subfolders)
    }
}

fn size_of(entry: &DiskEntry) -> i64 {
    i64::try_from(entry.stat.size).unwrap_or(i64::MAX)
}

fn new_row(volume_id: Uuid, parent_id: Uuid, entry: &DiskEntry) -> CreateFile {
    let (kind, media_type) = if entry.is_dir() {
        (FileKind::Folder, String::new())
    } else {
        (FileKind::File, media::media_type(&entry.name))
    };
    CreateFile {
        volume_id,
        parent_id: Some(parent_id),
        name: entry.name.clone(),
        kind,
        size: size_of(entry),
        last_modified: entry.stat.modified,
        media_type,
    }
}

/// Whether the last pass failed within one period and no new request has
/// come in since.
pub fn retry_held_off(
    last: Option<&Job>,
    indexing_requested: bool,
    now: DateTime<Utc>,
    period_minutes: u64,
) -> bool {
    if indexing_requested {
        return false;
    }
    let Some(job) = last.filter(|job| job.status == JobStatus::Error) else {
        return false;
    };
    i64::try_from(period_minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .is_some_and(|period| job.updated_at > now - period)
}

fn scan_failure(path: &Path, err: ScanError) -> AppError {
    match err {
        ScanError::Denied(e) | ScanError::Failed(e) => AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read {}: {e}", path.display()),
            e,
        ),
        ScanError::Vanished => AppError::not_found(format!("{} does not exist", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use rpidrive_storage::fs::FileStat;

    use super::*;

    fn entry(name: &str, is_dir: bool, size: u64) -> DiskEntry {
        DiskEntry {
            name: name.to_string(),
            stat: FileStat {
                is_dir,
                size,
                modified: Utc::now(),
            },
        }
    }

    fn index_job(status: JobStatus, updated_at: DateTime<Utc>) -> Job {
        Job {
            id: 1,
            kind: JobKind::Index,
            description: "Indexing media".to_string(),
            data: serde_json::json!({}),
            status,
            progress: 0,
            to_stop: false,
            volume_id: Some(Uuid::new_v4()),
            error: None,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn test_recent_failure_holds_retry() {
        let now = Utc::now();
        let failed = index_job(JobStatus::Error, now - Duration::minutes(5));
        assert!(retry_held_off(Some(&failed), false, now, 180));
        assert!(!retry_held_off(Some(&failed), true, now, 180));

        let old = index_job(JobStatus::Error, now - Duration::minutes(181));
        assert!(!retry_held_off(Some(&old), false, now, 180));
    }

    #[test]
    fn test_success_never_holds_retry() {
        let now = Utc::now();
        let done = index_job(JobStatus::Done, now);
        assert!(!retry_held_off(Some(&done), false, now, 180));
        assert!(!retry_held_off(None, false, now, 180));
    }

    #[test]
    fn test_new_row_for_file() {
        let volume = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let row = new_row(volume, parent, &entry("song.mp3", false, 42));
        assert_eq!(row.kind, FileKind::File);
        assert_eq!(row.size, 42);
        assert_eq!(row.parent_id, Some(parent));
        assert_eq!(row.media_type, "audio/mpeg");
    }

    #[test]
    fn test_new_row_for_folder() {
        let row = new_row(Uuid::new_v4(), Uuid::new_v4(), &entry("albums", true, 0));
        assert_eq!(row.kind, FileKind::Folder);
        assert_eq!(row.size, 0);
        assert!(row.media_type.is_empty());
    }

    #[test]
    fn test_unreadable_root_is_storage_error() {
        let err = scan_failure(
            Path::new("/srv/locked"),
            ScanError::Denied(std::io::Error::from(std::io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("/srv/locked"));

        let err = scan_failure(Path::new("/srv/gone"), ScanError::Vanished);
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
