//! Volume entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::VolumeKind;
use super::permission::VolumePermission;

/// A named mount of a host directory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Volume {
    /// Unique volume identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Backing kind.
    pub kind: VolumeKind,
    /// Absolute host directory for `HOST_PATH` volumes.
    pub path: String,
    /// Re-index requested.
    pub indexing: bool,
    /// End of the last successful indexing pass.
    pub last_indexed: Option<DateTime<Utc>>,
    /// When the volume was created.
    pub created_at: DateTime<Utc>,
}

impl Volume {
    /// Whether the indexer should walk this volume now.
    ///
    /// Due when explicitly requested, never indexed, or last indexed at
    /// least `period_minutes` ago.
    pub fn needs_indexing(&self, now: DateTime<Utc>, period_minutes: u64) -> bool {
        if !self.kind.is_local() {
            return false;
        }
        if self.indexing {
            return true;
        }
        match self.last_indexed {
            None => true,
            Some(at) => i64::try_from(period_minutes)
                .ok()
                .and_then(Duration::try_minutes)
                .is_some_and(|period| at <= now - period),
        }
    }
}

/// Data required to create a volume.
#[derive(Debug, Clone)]
pub struct CreateVolume {
    pub name: String,
    pub kind: VolumeKind,
    pub path: String,
}

/// Membership row granting a user a permission on a volume.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VolumeUser {
    /// Member user.
    pub user_id: i32,
    /// Volume.
    pub volume_id: Uuid,
    /// Granted level.
    pub permission: VolumePermission,
}
