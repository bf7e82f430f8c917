//! Disk space figures.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::Disks;

/// One mounted disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskInfo {
    pub name: String,
    pub mount_point: PathBuf,
    pub total: u64,
    pub available: u64,
}

/// Space on the disk holding a volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub total_space: u64,
    pub used_space: u64,
    pub free_space: u64,
}

/// All mounted disks.
pub fn list_disks() -> Vec<DiskInfo> {
    Disks::new_with_refreshed_list()
        .list()
        .iter()
        .map(|disk| DiskInfo {
            name: disk.name().to_string_lossy().into_owned(),
            mount_point: disk.mount_point().to_path_buf(),
            total: disk.total_space(),
            available: disk.available_space(),
        })
        .collect()
}

/// Usage of the disk whose mount point is the longest prefix of `path`.
pub fn usage_for(path: &Path) -> DiskUsage {
    usage_among(&list_disks(), path)
}

/// Zeros when no disk matches.
pub fn usage_among(disks: &[DiskInfo], path: &Path) -> DiskUsage {
    disks
        .iter()
        .filter(|disk| path.starts_with(&disk.mount_point))
        .max_by_key(|disk| disk.mount_point.components().count())
        .map(|disk| DiskUsage {
            total_space: disk.total,
            used_space: disk.total.saturating_sub(disk.available),
            free_space: disk.available,
        })
        .unwrap_or_default()
}
