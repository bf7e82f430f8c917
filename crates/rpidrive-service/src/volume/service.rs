//! Volume CRUD, membership and index requests.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use rpidrive_auth::PermissionResolver;
use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_entity::activity::ActivityKind;
use rpidrive_entity::volume::{CreateVolume, Volume, VolumeKind, VolumePermission, VolumeUser};
use rpidrive_storage::disk::{self, DiskInfo};

use crate::activity::ActivityLogger;
use crate::context::RequestContext;
use crate::lookup::EntityLookup;

/// Fields accepted when creating a volume.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVolumeRequest {
    pub name: String,
    pub kind: VolumeKind,
    pub path: String,
}

/// One membership in an update request.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberRequest {
    pub user: i32,
    pub permission: VolumePermission,
}

/// Fields accepted when updating a volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVolumeRequest {
    pub name: Option<String>,
    pub path: Option<String>,
    /// Replaces the whole member set when present.
    pub users: Option<Vec<MemberRequest>>,
}

/// A volume as listed, with space figures of its disk.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSummary {
    pub id: Uuid,
    pub name: String,
    pub kind: VolumeKind,
    pub indexing: bool,
    pub path: String,
    pub last_indexed: Option<DateTime<Utc>>,
    pub total_space: u64,
    pub used_space: u64,
    pub free_space: u64,
}

/// A single volume with the caller's permission.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeDetails {
    #[serde(flatten)]
    pub volume: Volume,
    pub root_id: Uuid,
    pub permission: VolumePermission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<VolumeUser>>,
}

/// `{name, value}` pair for the kinds and permissions listings.
#[derive(Debug, Clone, Serialize)]
pub struct NamedValue {
    pub name: &'static str,
    pub value: serde_json::Value,
}

/// Volume management.
#[derive(Debug, Clone)]
pub struct VolumeService {
    volumes: Arc<VolumeRepository>,
    files: Arc<FileRepository>,
    resolver: Arc<PermissionResolver>,
    lookup: EntityLookup,
    activity: ActivityLogger,
}

impl VolumeService {
    /// Creates a new volume service.
    pub fn new(
        volumes: Arc<VolumeRepository>,
        files: Arc<FileRepository>,
        resolver: Arc<PermissionResolver>,
        lookup: EntityLookup,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            volumes,
            files,
            resolver,
            lookup,
            activity,
        }
    }

    /// Volumes visible to the caller.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<VolumeSummary>> {
        let volumes = self.resolver.visible_volumes(&ctx.user).await?;
        let disks = tokio::task::spawn_blocking(disk::list_disks)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Disk probe panicked", e))?;
        Ok(volumes
            .into_iter()
            .map(|volume| summarize(volume, &disks))
            .collect())
    }

    /// Create a volume and its root folder. Superuser only.
    pub async fn create(&self, ctx: &RequestContext, req: CreateVolumeRequest) -> AppResult<Volume> {
        ctx.require_superuser()?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Volume name must not be empty"));
        }
        if self.volumes.find_by_name(&name).await?.is_some() {
            return Err(AppError::conflict(format!("Volume '{name}' already exists")));
        }
        if req.kind == VolumeKind::HostPath {
            validate_host_path(&req.path)?;
        }

        let (volume, root) = self
            .volumes
            .create_with_root(&CreateVolume {
                name,
                kind: req.kind,
                path: req.path,
            })
            .await?;

        info!(volume_id = %volume.id, name = %volume.name, path = %volume.path, "Volume created");
        self.activity
            .record(
                Some(ctx.user_id()),
                ActivityKind::CreateVolume,
                json!({ "id": volume.id, "name": volume.name, "root_id": root.id }),
            )
            .await;
        Ok(volume)
    }

    /// One volume; 404 unless visible.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<VolumeDetails> {
        let permission = self
            .resolver
            .require(&ctx.user, id, VolumePermission::Read)
            .await?;
        let volume = self.lookup.require_volume(id).await?;
        let root = self
            .files
            .find_root(id)
            .await?
            .ok_or_else(|| AppError::internal("Volume has no root folder"))?;
        let users = if ctx.is_superuser() {
            Some(self.volumes.members(id).await?)
        } else {
            None
        };
        Ok(VolumeDetails {
            volume,
            root_id: root.id,
            permission,
            users,
        })
    }

    /// Update name, path and members. Superuser only.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: UpdateVolumeRequest,
    ) -> AppResult<Volume> {
        ctx.require_superuser()?;
        let current = self.lookup.require_volume(id).await?;

        let name = match req.name.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("Volume name must not be empty")),
            Some(name) if name != current.name => {
                if self.volumes.find_by_name(name).await?.is_some() {
                    return Err(AppError::conflict(format!("Volume '{name}' already exists")));
                }
                Some(name.to_string())
            }
            _ => None,
        };
        if let Some(path) = req.path.as_deref() {
            if current.kind == VolumeKind::HostPath {
                validate_host_path(path)?;
            }
        }

        let volume = self
            .volumes
            .update(id, name.as_deref(), req.path.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("Volume not found"))?;

        if let Some(members) = &req.users {
            let members: Vec<(i32, VolumePermission)> =
                members.iter().map(|m| (m.user, m.permission)).collect();
            self.volumes.replace_members(id, &members).await?;
        }
        self.lookup.forget_volume(id).await;

        info!(volume_id = %id, "Volume updated");
        self.activity
            .record(
                Some(ctx.user_id()),
                ActivityKind::UpdateVolume,
                json!({
                    "id": id,
                    "name": req.name,
                    "path": req.path,
                    "members": req.users.as_ref().map(Vec::len),
                }),
            )
            .await;
        Ok(volume)
    }

    /// Delete a volume and its file rows. Superuser only; files on disk stay.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.require_superuser()?;
        let volume = self.lookup.require_volume(id).await?;
        if !self.volumes.delete(id).await? {
            return Err(AppError::not_found("Volume not found"));
        }
        self.lookup.forget_volume(id).await;

        info!(volume_id = %id, name = %volume.name, "Volume deleted");
        self.activity
            .record(
                Some(ctx.user_id()),
                ActivityKind::DeleteVolume,
                json!({ "id": id, "name": volume.name }),
            )
            .await;
        Ok(())
    }

    /// Ask the worker to index the volume. Requires ADMIN.
    pub async fn request_index(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        self.resolver
            .require(&ctx.user, id, VolumePermission::Admin)
            .await?;
        let volume = self.lookup.require_volume(id).await?;
        if !volume.kind.is_local() {
            return Err(AppError::invalid_operation(
                "Only host path volumes can be indexed",
            ));
        }
        self.volumes.set_indexing(id, true).await?;
        self.lookup.forget_volume(id).await;

        info!(volume_id = %id, "Index requested");
        self.activity
            .record(
                Some(ctx.user_id()),
                ActivityKind::IndexVolume,
                json!({ "id": id, "name": volume.name }),
            )
            .await;
        Ok(())
    }

    /// Known volume kinds.
    pub fn kinds() -> Vec<NamedValue> {
        VolumeKind::ALL
            .iter()
            .map(|kind| NamedValue {
                name: kind.label(),
                value: json!(kind.as_str()),
            })
            .collect()
    }

    /// Permission levels.
    pub fn permissions() -> Vec<NamedValue> {
        VolumePermission::ALL
            .iter()
            .map(|p| NamedValue {
                name: p.as_str(),
                value: json!(p.value()),
            })
            .collect()
    }
}

fn summarize(volume: Volume, disks: &[DiskInfo]) -> VolumeSummary {
    let usage = if volume.kind.is_local() {
        disk::usage_among(disks, Path::new(&volume.path))
    } else {
        Default::default()
    };
    VolumeSummary {
        id: volume.id,
        name: volume.name,
        kind: volume.kind,
        indexing: volume.indexing,
        path: volume.path,
        last_indexed: volume.last_indexed,
        total_space: usage.total_space,
        used_space: usage.used_space,
        free_space: usage.free_space,
    }
}

fn validate_host_path(path: &str) -> AppResult<()> {
    let path = Path::new(path);
    if !path.is_absolute() {
        return Err(AppError::validation("Volume path must be absolute"));
    }
    if !path.is_dir() {
        return Err(AppError::validation(format!(
            "Volume path {} is not an existing directory",
            path.display()
        )));
    }
    Ok(())
}
