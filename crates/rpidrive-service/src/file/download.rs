//! Download resolution, public links and thumbnails.

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_entity::file::File;
use rpidrive_entity::share::PublicFileLink;
use rpidrive_entity::volume::VolumePermission;
use rpidrive_storage::media::MediaKind;
use rpidrive_storage::{fs, thumbnail};

use crate::context::RequestContext;

use super::service::FileService;

/// A file ready to be streamed.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub file: File,
    pub path: PathBuf,
    /// Current on-disk size.
    pub size: u64,
}

impl FileService {
    async fn target(&self, file: File) -> AppResult<DownloadTarget> {
        if file.is_folder() {
            return Err(AppError::validation("Folders cannot be downloaded"));
        }
        let path = self.disk_path(&file).await?;
        let stat = fs::stat(&path).await?;
        Ok(DownloadTarget {
            file,
            path,
            size: stat.size,
        })
    }

    /// Resolve a file the caller may read for streaming.
    pub async fn download(&self, ctx: &RequestContext, id: Uuid) -> AppResult<DownloadTarget> {
        let file = self.load_with(ctx, id, VolumePermission::Read).await?;
        self.target(file).await
    }

    /// Create a public link valid for the configured lifetime.
    pub async fn share(&self, ctx: &RequestContext, id: Uuid) -> AppResult<PublicFileLink> {
        let file = self.load_with(ctx, id, VolumePermission::Read).await?;
        if file.is_folder() {
            return Err(AppError::validation("Only files can be shared"));
        }
        let expire_time = Utc::now() + self.public_link_expiry;
        let link = self.shares.create(file.id, expire_time).await?;
        info!(
            user_id = ctx.user_id(),
            file_id = %file.id,
            link_id = %link.id,
            expire_time = %link.expire_time,
            "Public link created"
        );
        Ok(link)
    }

    /// Resolve an unauthenticated link key. Unknown and expired keys are
    /// both `NotFound`.
    pub async fn quick_access(&self, key: Uuid) -> AppResult<DownloadTarget> {
        let link = self
            .shares
            .find_valid(key, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Link not found or expired"))?;
        let file = self.load(link.file_id).await?;
        self.target(file).await
    }

    /// PNG thumbnail of a picture.
    pub async fn thumbnail(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Vec<u8>> {
        let file = self.load_with(ctx, id, VolumePermission::Read).await?;
        if file.is_folder() || !MediaKind::classify(&file.name).is_picture() {
            return Err(AppError::validation("Thumbnails are only available for pictures"));
        }
        let path = self.disk_path(&file).await?;
        thumbnail::generate(&path, thumbnail::THUMBNAIL_SIZE).await
    }
}
