//! Reading one directory level of a volume from disk.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use rpidrive_storage::fs::FileStat;

/// One entry observed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    pub name: String,
    pub stat: FileStat,
}

impl DiskEntry {
    pub fn is_dir(&self) -> bool {
        self.stat.is_dir
    }
}

/// Why a directory could not be listed.
#[derive(Debug)]
pub enum ScanError {
    /// The directory exists but may not be read; its subtree is left alone.
    Denied(io::Error),
    /// The directory disappeared while the pass was running.
    Vanished,
    /// Any other I/O failure; aborts the pass.
    Failed(io::Error),
}

impl ScanError {
    fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::Denied(err),
            io::ErrorKind::NotFound => Self::Vanished,
            _ => Self::Failed(err),
        }
    }
}

/// List the immediate children of `dir`.
///
/// Symlinks and special files are skipped, hidden files are kept. Entries
/// whose metadata or name cannot be read are logged and skipped.
pub fn read_dir(dir: &Path) -> Result<Vec<DiskEntry>, ScanError> {
    let mut entries = Vec::new();
    for item in WalkDir::new(dir).max_depth(1).follow_links(false) {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let err = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory loop"));
                return Err(ScanError::from_io(err));
            }
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.depth() == 0 {
            if !entry.file_type().is_dir() {
                return Err(ScanError::Failed(io::Error::other(format!(
                    "{} is not a directory",
                    dir.display()
                ))));
            }
            continue;
        }

        let file_type = entry.file_type();
        if !file_type.is_dir() && !file_type.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %entry.path().display(), "Skipping entry with a non UTF-8 name");
            continue;
        };
        match entry.metadata() {
            Ok(meta) => entries.push(DiskEntry {
                name,
                stat: FileStat::from_metadata(&meta),
            }),
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "Skipping entry without metadata");
            }
        }
    }
    Ok(entries)
}

/// [`read_dir`] on the blocking pool.
pub async fn read_dir_async(dir: PathBuf) -> Result<Vec<DiskEntry>, ScanError> {
    tokio::task::spawn_blocking(move || read_dir(&dir))
        .await
        .unwrap_or_else(|e| Err(ScanError::Failed(io::Error::other(e))))
}
