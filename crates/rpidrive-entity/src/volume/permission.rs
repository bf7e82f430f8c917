//! Per-volume permission levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission a user holds on a volume.
///
/// The discriminants are persisted and ordered: ADMIN > READ_WRITE > READ.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
#[serde(try_from = "i32", into = "i32")]
pub enum VolumePermission {
    /// List, read and download.
    Read = 10,
    /// Create, rename, move and delete files.
    ReadWrite = 20,
    /// Trigger indexing and manage the volume.
    Admin = 30,
}

impl VolumePermission {
    /// Every level in ascending order.
    pub const ALL: [VolumePermission; 3] = [Self::Read, Self::ReadWrite, Self::Admin];

    /// Persisted integer value.
    pub fn value(&self) -> i32 {
        *self as i32
    }

    /// Return the permission name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::ReadWrite => "READ_WRITE",
            Self::Admin => "ADMIN",
        }
    }

    /// Check if this level grants at least `required`.
    pub fn has_at_least(&self, required: VolumePermission) -> bool {
        *self >= required
    }

    /// Parse a persisted integer.
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            10 => Some(Self::Read),
            20 => Some(Self::ReadWrite),
            30 => Some(Self::Admin),
            _ => None,
        }
    }
}

impl TryFrom<i32> for VolumePermission {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("Unknown permission value: {value}"))
    }
}

impl From<VolumePermission> for i32 {
    fn from(value: VolumePermission) -> Self {
        value.value()
    }
}

impl fmt::Display for VolumePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
