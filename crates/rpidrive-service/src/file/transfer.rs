//! Moving files between folders and volumes.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_entity::file::File;
use rpidrive_entity::volume::VolumePermission;
use rpidrive_storage::fs;

use crate::context::RequestContext;

use super::service::FileService;

/// What to do when the destination already holds the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveStrategy {
    /// Pick a free name such as `a (1).txt`; never overwrites.
    #[default]
    Rename,
    /// Remove the existing entry first.
    Overwrite,
}

/// Body of a move request.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub files: Vec<Uuid>,
    pub move_to: Uuid,
    #[serde(default)]
    pub strategy: MoveStrategy,
}

impl FileService {
    /// Move files into `req.move_to`.
    ///
    /// Requires READ_WRITE on every source and on the destination. Moving
    /// into the current parent is a no-op; moving a folder into itself or
    /// one of its descendants is refused.
    pub async fn move_files(&self, ctx: &RequestContext, req: MoveRequest) -> AppResult<()> {
        let dest = self
            .load_folder_with(ctx, req.move_to, VolumePermission::ReadWrite)
            .await?;

        let mut sources = Vec::with_capacity(req.files.len());
        for id in &req.files {
            let file = self.load_with(ctx, *id, VolumePermission::ReadWrite).await?;
            if file.is_root() {
                return Err(AppError::invalid_operation("Cannot move the volume root"));
            }
            if file.is_folder()
                && (file.id == dest.id || self.files.is_within(dest.id, file.id).await?)
            {
                return Err(AppError::invalid_operation(format!(
                    "Cannot move '{}' into itself",
                    file.name
                )));
            }
            sources.push(file);
        }

        for file in sources {
            if file.parent_id == Some(dest.id) {
                continue;
            }
            self.move_one(ctx, file, &dest, req.strategy).await?;
        }
        Ok(())
    }

    async fn move_one(
        &self,
        ctx: &RequestContext,
        file: File,
        dest: &File,
        strategy: MoveStrategy,
    ) -> AppResult<()> {
        let src_path = self.disk_path(&file).await?;
        let dest_dir = self.disk_path(dest).await?;

        let mut tx = self.files.begin().await?;
        if FileRepository::lock_in(&mut tx, file.id).await?.is_none() {
            return Err(AppError::not_found(format!("'{}' no longer exists", file.name)));
        }
        if FileRepository::lock_in(&mut tx, dest.id).await?.is_none() {
            return Err(AppError::not_found("Destination folder no longer exists"));
        }

        let existing = FileRepository::lock_child_in(&mut tx, dest.id, &file.name).await?;
        let name = match strategy {
            MoveStrategy::Overwrite => {
                let target = dest_dir.join(&file.name);
                let holds_source = match &existing {
                    Some(existing) => self.files.is_within(file.id, existing.id).await?,
                    None => false,
                };
                if holds_source || src_path.starts_with(&target) {
                    return Err(AppError::invalid_operation(format!(
                        "Cannot overwrite '{}' with an entry it contains",
                        file.name
                    )));
                }
                fs::remove_path(&target).await?;
                if let Some(existing) = existing {
                    FileRepository::delete_in(&mut tx, existing.id).await?;
                }
                fs::move_path(&src_path, &target).await?;
                file.name.clone()
            }
            MoveStrategy::Rename => {
                let taken: HashSet<String> = FileRepository::lock_children_in(&mut tx, dest.id)
                    .await?
                    .into_iter()
                    .map(|f| f.name)
                    .collect();
                fs::move_unique(&src_path, &dest_dir, &file.name, &taken).await?
            }
        };

        let dest_path = dest_dir.join(&name);
        FileRepository::move_in(&mut tx, file.id, dest.id, dest.volume_id, &name).await?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit move: {e}")))?;

        info!(
            user_id = ctx.user_id(),
            file_id = %file.id,
            from = %src_path.display(),
            to = %dest_path.display(),
            "File moved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_defaults_to_rename() {
        let req: MoveRequest = serde_json::from_value(serde_json::json!({
            "files": [],
            "move_to": Uuid::nil(),
        }))
        .unwrap();
        assert_eq!(req.strategy, MoveStrategy::Rename);

        let req: MoveRequest = serde_json::from_value(serde_json::json!({
            "files": [],
            "move_to": Uuid::nil(),
            "strategy": "overwrite",
        }))
        .unwrap();
        assert_eq!(req.strategy, MoveStrategy::Overwrite);
    }
}
