//! Placing uploaded files into a volume.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info};
use uuid::Uuid;

use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_entity::file::{CreateFile, File, FileKind};
use rpidrive_entity::volume::VolumePermission;
use rpidrive_storage::{fs, media, naming};

use crate::context::RequestContext;

use super::service::FileService;

/// An uploaded file already written to the staging directory.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    /// Staging file holding the bytes.
    pub staged: PathBuf,
    /// Destination relative to the target folder, e.g. `album/cover.jpg`.
    pub relative_path: String,
}

impl FileService {
    /// Move staged uploads under `parent_id`, creating intermediate folders.
    ///
    /// A name collision on the final component picks a free name. Staged
    /// files that were not placed are removed.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        uploads: Vec<StagedUpload>,
    ) -> AppResult<Vec<File>> {
        if uploads.is_empty() {
            return Err(AppError::validation("No file uploaded"));
        }

        let result = self.place_all(ctx, parent_id, &uploads).await;
        for upload in &uploads {
            fs::remove_path_best_effort(&upload.staged).await;
        }
        result
    }

    async fn place_all(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        uploads: &[StagedUpload],
    ) -> AppResult<Vec<File>> {
        let parent = self
            .load_folder_with(ctx, parent_id, VolumePermission::ReadWrite)
            .await?;

        let mut created = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let mut components = naming::split_relative_path(&upload.relative_path)?;
            let Some(file_name) = components.pop() else {
                return Err(AppError::validation("Invalid upload path"));
            };

            let mut folder = parent.clone();
            for name in components {
                folder = self.ensure_folder(&folder, &name).await?;
            }
            let file = self.place(&folder, &file_name, upload).await?;
            info!(
                user_id = ctx.user_id(),
                file_id = %file.id,
                size = file.size,
                "File uploaded"
            );
            created.push(file);
        }
        Ok(created)
    }

    async fn ensure_folder(&self, parent: &File, name: &str) -> AppResult<File> {
        if let Some(existing) = self.files.find_child(parent.id, name).await? {
            if existing.is_folder() {
                return Ok(existing);
            }
            return Err(AppError::conflict(format!("'{name}' exists and is not a folder")));
        }

        let path = self.disk_path(parent).await?.join(name);
        fs::create_dir(&path).await?;
        match self
            .files
            .create(&CreateFile::folder(parent.volume_id, parent.id, name))
            .await
        {
            Ok(folder) => {
                debug!(folder_id = %folder.id, path = %path.display(), "Created upload folder");
                Ok(folder)
            }
            // lost a race with another upload or the indexer
            Err(e) if e.kind == ErrorKind::Conflict => self
                .files
                .find_child(parent.id, name)
                .await?
                .filter(File::is_folder)
                .ok_or(e),
            Err(e) => Err(e),
        }
    }

    async fn place(&self, folder: &File, desired: &str, upload: &StagedUpload) -> AppResult<File> {
        let dir = self.disk_path(folder).await?;
        let taken: HashSet<String> = self.files.child_names(folder.id).await?.into_iter().collect();
        let name = fs::move_unique(&upload.staged, &dir, desired, &taken).await?;

        let path = dir.join(&name);
        let stat = fs::stat(&path).await?;

        let mut tx = self.files.begin().await?;
        let file = FileRepository::upsert_in(
            &mut tx,
            &CreateFile {
                volume_id: folder.volume_id,
                parent_id: Some(folder.id),
                name: name.clone(),
                kind: FileKind::File,
                size: i64::try_from(stat.size).unwrap_or(i64::MAX),
                last_modified: stat.modified,
                media_type: media::media_type(&name),
            },
        )
        .await?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit upload: {e}")))?;
        Ok(file)
    }
}
