//! File reads and in-place mutations with volume permission checks.
//!
//! Mutations follow one order: lock the row, change the filesystem, change
//! the database, commit. A failure before the commit rolls the database
//! back; a crash after the filesystem change is healed by the next index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use rpidrive_auth::PermissionResolver;
use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_database::repositories::share::ShareRepository;
use rpidrive_entity::file::{CreateFile, File, FileRef};
use rpidrive_entity::volume::{Volume, VolumePermission};
use rpidrive_storage::{fs, naming};

use crate::context::RequestContext;
use crate::lookup::EntityLookup;

/// Maximum number of search hits returned.
pub const SEARCH_LIMIT: i64 = 200;

/// Absolute path of `file` inside `volume`, built from its ancestor names.
pub async fn resolve_disk_path(
    files: &FileRepository,
    volume: &Volume,
    file: &File,
) -> AppResult<PathBuf> {
    let mut names: Vec<String> = files
        .ancestors(file.id)
        .await?
        .into_iter()
        .map(|a| a.name)
        .filter(|name| !name.is_empty())
        .collect();
    if !file.is_root() {
        names.push(file.name.clone());
    }
    Ok(fs::resolve(Path::new(&volume.path), &names))
}

/// Extras requested with `?fields=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileFields {
    pub volume: bool,
    pub parent: bool,
    pub children: bool,
    pub path: bool,
}

impl FileFields {
    /// Parse a comma separated list; unknown names are ignored.
    pub fn parse(fields: Option<&str>) -> Self {
        let mut out = Self::default();
        for field in fields.unwrap_or_default().split(',').map(str::trim) {
            match field {
                "volume" => out.volume = true,
                "parent" => out.parent = true,
                "children" => out.children = true,
                "path" => out.path = true,
                _ => {}
            }
        }
        out
    }
}

/// A file with the requested extras.
#[derive(Debug, Clone, Serialize)]
pub struct FileDetails {
    #[serde(flatten)]
    pub file: File,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<FileRef>,
    /// `Some(None)` serializes as `null` for the volume root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Option<File>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<File>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<FileRef>>,
}

/// File operations.
#[derive(Debug, Clone)]
pub struct FileService {
    pub(super) files: Arc<FileRepository>,
    pub(super) shares: Arc<ShareRepository>,
    pub(super) jobs: Arc<JobRepository>,
    pub(super) resolver: Arc<PermissionResolver>,
    pub(super) lookup: EntityLookup,
    pub(super) temp_dir: PathBuf,
    pub(super) public_link_expiry: chrono::Duration,
}

impl FileService {
    /// Creates a new file service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        files: Arc<FileRepository>,
        shares: Arc<ShareRepository>,
        jobs: Arc<JobRepository>,
        resolver: Arc<PermissionResolver>,
        lookup: EntityLookup,
        temp_dir: PathBuf,
        public_link_expiry_seconds: u64,
    ) -> Self {
        Self {
            files,
            shares,
            jobs,
            resolver,
            lookup,
            temp_dir,
            public_link_expiry: chrono::Duration::seconds(
                i64::try_from(public_link_expiry_seconds).unwrap_or(i64::MAX / 1000),
            ),
        }
    }

    /// Staging directory for uploads.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub(super) async fn load(&self, id: Uuid) -> AppResult<File> {
        self.files
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Load a file and require `min` on its volume.
    ///
    /// Files on volumes the caller cannot see are reported as not found.
    pub async fn load_with(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        min: VolumePermission,
    ) -> AppResult<File> {
        let file = self.load(id).await?;
        self.resolver.require(&ctx.user, file.volume_id, min).await?;
        Ok(file)
    }

    pub(super) async fn load_folder_with(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        min: VolumePermission,
    ) -> AppResult<File> {
        let folder = self.load_with(ctx, id, min).await?;
        if !folder.is_folder() {
            return Err(AppError::validation(format!("'{}' is not a folder", folder.name)));
        }
        Ok(folder)
    }

    /// Host volume of `file`; other volume kinds have no local bytes.
    pub(super) async fn local_volume(&self, volume_id: Uuid) -> AppResult<Volume> {
        let volume = self.lookup.require_volume(volume_id).await?;
        if !volume.kind.is_local() {
            return Err(AppError::invalid_operation(format!(
                "Volume '{}' is not stored on this host",
                volume.name
            )));
        }
        Ok(volume)
    }

    /// Absolute path of `file` on the host.
    pub async fn disk_path(&self, file: &File) -> AppResult<PathBuf> {
        let volume = self.local_volume(file.volume_id).await?;
        resolve_disk_path(&self.files, &volume, file).await
    }

    /// A file with the extras named in `fields`.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        fields: FileFields,
    ) -> AppResult<FileDetails> {
        let file = self.load_with(ctx, id, VolumePermission::Read).await?;

        let volume = if fields.volume {
            let volume = self.lookup.require_volume(file.volume_id).await?;
            Some(FileRef {
                id: volume.id,
                name: volume.name,
            })
        } else {
            None
        };
        let parent = match (fields.parent, file.parent_id) {
            (false, _) => None,
            (true, None) => Some(None),
            (true, Some(parent_id)) => Some(self.files.find_by_id(parent_id).await?),
        };
        let children = if fields.children && file.is_folder() {
            Some(self.files.children(file.id).await?)
        } else if fields.children {
            Some(Vec::new())
        } else {
            None
        };
        let path = if fields.path {
            Some(self.files.ancestors(file.id).await?)
        } else {
            None
        };

        Ok(FileDetails {
            file,
            volume,
            parent,
            children,
            path,
        })
    }

    /// Case-insensitive substring search across visible volumes.
    pub async fn search(&self, ctx: &RequestContext, keyword: &str) -> AppResult<Vec<File>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::validation("Missing keyword"));
        }
        let volume_ids = self.resolver.visible_volume_ids(&ctx.user).await?;
        if volume_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.files.search(keyword, &volume_ids, SEARCH_LIMIT).await
    }

    /// Create a folder under `parent_id`.
    pub async fn new_folder(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        name: &str,
    ) -> AppResult<File> {
        let parent = self
            .load_folder_with(ctx, parent_id, VolumePermission::ReadWrite)
            .await?;
        let name = naming::sanitize_name(name)?;
        if self.files.find_child(parent.id, &name).await?.is_some() {
            return Err(AppError::conflict(format!("'{name}' already exists")));
        }

        let path = self.disk_path(&parent).await?.join(&name);
        fs::create_dir(&path).await?;
        let folder = self
            .files
            .create(&CreateFile::folder(parent.volume_id, parent.id, &name))
            .await?;

        info!(user_id = ctx.user_id(), file_id = %folder.id, path = %path.display(), "Folder created");
        Ok(folder)
    }

    /// Rename a file or folder in place.
    pub async fn rename(&self, ctx: &RequestContext, id: Uuid, name: &str) -> AppResult<File> {
        let file = self.load_with(ctx, id, VolumePermission::ReadWrite).await?;
        let Some(parent_id) = file.parent_id else {
            return Err(AppError::invalid_operation("Cannot rename the volume root"));
        };
        let name = naming::sanitize_name(name)?;
        if name == file.name {
            return Ok(file);
        }

        let old_path = self.disk_path(&file).await?;
        let new_path = old_path.with_file_name(&name);

        let mut tx = self.files.begin().await?;
        let file = FileRepository::lock_in(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        if FileRepository::lock_child_in(&mut tx, parent_id, &name)
            .await?
            .is_some()
            || tokio::fs::try_exists(&new_path).await.unwrap_or(false)
        {
            return Err(AppError::conflict(format!("'{name}' already exists")));
        }

        fs::move_path(&old_path, &new_path).await?;
        FileRepository::rename_in(&mut tx, id, &name).await?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit rename: {e}")))?;

        info!(user_id = ctx.user_id(), file_id = %id, from = %file.name, to = %name, "File renamed");
        Ok(File { name, ..file })
    }

    /// Delete files and folders, disk first (best effort) then rows.
    pub async fn delete(&self, ctx: &RequestContext, ids: &[Uuid]) -> AppResult<()> {
        let mut targets = Vec::with_capacity(ids.len());
        for id in ids {
            let file = self.load_with(ctx, *id, VolumePermission::ReadWrite).await?;
            if file.is_root() {
                return Err(AppError::invalid_operation("Cannot delete the volume root"));
            }
            targets.push(file);
        }

        for file in targets {
            let path = self.disk_path(&file).await?;
            let mut tx = self.files.begin().await?;
            if FileRepository::lock_in(&mut tx, file.id).await?.is_none() {
                // already gone, e.g. inside a folder deleted earlier in this batch
                continue;
            }
            fs::remove_path_best_effort(&path).await;
            FileRepository::delete_in(&mut tx, file.id).await?;
            tx.commit()
                .await
                .map_err(|e| AppError::database(format!("Failed to commit delete: {e}")))?;
            info!(user_id = ctx.user_id(), file_id = %file.id, path = %path.display(), "File deleted");
        }
        Ok(())
    }
}
