//! Playlists owned by a single user.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use rpidrive_auth::PermissionResolver;
use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::playlist::PlaylistRepository;
use rpidrive_entity::file::File;
use rpidrive_entity::playlist::Playlist;
use rpidrive_entity::volume::VolumePermission;

use crate::context::RequestContext;

/// A playlist with its files in sequence order.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistDetails {
    pub id: i32,
    pub name: String,
    pub files: Vec<File>,
}

/// Body of `POST /playlists/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PlaylistAction {
    Rename { name: String },
    AddFile { file: Uuid },
    RemoveFile { file: Uuid },
    Reorder { files: Vec<Uuid> },
}

/// Playlist operations; a playlist is invisible to everyone but its owner.
#[derive(Debug, Clone)]
pub struct PlaylistService {
    playlists: Arc<PlaylistRepository>,
    files: Arc<FileRepository>,
    resolver: Arc<PermissionResolver>,
}

fn playlist_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Playlist name must not be empty"));
    }
    Ok(name.to_string())
}

/// Whether `order` is a permutation of `current`.
pub fn is_permutation(current: &[Uuid], order: &[Uuid]) -> bool {
    if current.len() != order.len() {
        return false;
    }
    let current: HashSet<&Uuid> = current.iter().collect();
    let order_set: HashSet<&Uuid> = order.iter().collect();
    order_set.len() == order.len() && current == order_set
}

/// Full member order for a reorder request. `order` must be a permutation of
/// the visible members; hidden members follow in their current order.
pub fn reorder_plan(members: &[(Uuid, bool)], order: &[Uuid]) -> AppResult<Vec<Uuid>> {
    let visible: Vec<Uuid> = members.iter().filter(|(_, v)| *v).map(|(id, _)| *id).collect();
    if !is_permutation(&visible, order) {
        return Err(AppError::validation(
            "Order must list every playlist file exactly once",
        ));
    }
    Ok(order
        .iter()
        .copied()
        .chain(members.iter().filter(|(_, v)| !*v).map(|(id, _)| *id))
        .collect())
}

impl PlaylistService {
    /// Creates a new playlist service.
    pub fn new(
        playlists: Arc<PlaylistRepository>,
        files: Arc<FileRepository>,
        resolver: Arc<PermissionResolver>,
    ) -> Self {
        Self {
            playlists,
            files,
            resolver,
        }
    }

    async fn owned(&self, ctx: &RequestContext, id: i32) -> AppResult<Playlist> {
        self.playlists
            .find_for_owner(id, ctx.user_id())
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))
    }

    /// The caller's playlists.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Playlist>> {
        self.playlists.list_for_owner(ctx.user_id()).await
    }

    /// Create an empty playlist.
    pub async fn create(&self, ctx: &RequestContext, name: &str) -> AppResult<Playlist> {
        let playlist = self
            .playlists
            .create(ctx.user_id(), &playlist_name(name)?)
            .await?;
        info!(user_id = ctx.user_id(), playlist_id = playlist.id, "Playlist created");
        Ok(playlist)
    }

    async fn visible_volumes(&self, ctx: &RequestContext) -> AppResult<HashSet<Uuid>> {
        Ok(self
            .resolver
            .visible_volume_ids(&ctx.user)
            .await?
            .into_iter()
            .collect())
    }

    /// A playlist with the files the caller can still see.
    pub async fn get(&self, ctx: &RequestContext, id: i32) -> AppResult<PlaylistDetails> {
        let playlist = self.owned(ctx, id).await?;
        let visible = self.visible_volumes(ctx).await?;
        let files = self
            .playlists
            .files(id)
            .await?
            .into_iter()
            .filter(|f| visible.contains(&f.volume_id))
            .collect();
        Ok(PlaylistDetails {
            id: playlist.id,
            name: playlist.name,
            files,
        })
    }

    /// Apply one action.
    pub async fn apply(
        &self,
        ctx: &RequestContext,
        id: i32,
        action: PlaylistAction,
    ) -> AppResult<()> {
        self.owned(ctx, id).await?;
        match action {
            PlaylistAction::Rename { name } => {
                self.playlists.rename(id, &playlist_name(&name)?).await?;
            }
            PlaylistAction::AddFile { file } => {
                let file = self
                    .files
                    .find_by_id(file)
                    .await?
                    .ok_or_else(|| AppError::not_found("File not found"))?;
                self.resolver
                    .require(&ctx.user, file.volume_id, VolumePermission::Read)
                    .await?;
                if file.is_folder() {
                    return Err(AppError::validation("Only files can be added to a playlist"));
                }
                if self.playlists.file_ids(id).await?.contains(&file.id) {
                    return Err(AppError::validation("File is already in the playlist"));
                }
                self.playlists.add_file(id, file.id).await?;
            }
            PlaylistAction::RemoveFile { file } => {
                if !self.playlists.remove_file(id, file).await? {
                    return Err(AppError::not_found("File is not in the playlist"));
                }
            }
            PlaylistAction::Reorder { files } => {
                let visible = self.visible_volumes(ctx).await?;
                let members: Vec<(Uuid, bool)> = self
                    .playlists
                    .files(id)
                    .await?
                    .into_iter()
                    .map(|f| (f.id, visible.contains(&f.volume_id)))
                    .collect();
                let order = reorder_plan(&members, &files)?;
                self.playlists.reorder(id, &order).await?;
            }
        }
        info!(user_id = ctx.user_id(), playlist_id = id, "Playlist updated");
        Ok(())
    }

    /// Delete a playlist.
    pub async fn delete(&self, ctx: &RequestContext, id: i32) -> AppResult<()> {
        self.owned(ctx, id).await?;
        self.playlists.delete(id).await?;
        info!(user_id = ctx.user_id(), playlist_id = id, "Playlist deleted");
        Ok(())
    }
}
