//! Volume kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backing kind of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "volume_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeKind {
    /// A directory on the host filesystem.
    HostPath,
    /// Another drive instance reachable over the network.
    RemoteRpiDrive,
}

impl VolumeKind {
    /// Every kind, in display order.
    pub const ALL: [VolumeKind; 2] = [Self::HostPath, Self::RemoteRpiDrive];

    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostPath => "HOST_PATH",
            Self::RemoteRpiDrive => "REMOTE_RPI_DRIVE",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::HostPath => "Host Path",
            Self::RemoteRpiDrive => "Remote RPi Drive",
        }
    }

    /// Only host paths are walked by the indexer and served from disk.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::HostPath)
    }
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VolumeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOST_PATH" => Ok(Self::HostPath),
            "REMOTE_RPI_DRIVE" => Ok(Self::RemoteRpiDrive),
            other => Err(format!("Unknown volume kind: {other}")),
        }
    }
}
