//! Filesystem mutations on volume trees.
//!
//! Callers mutate the filesystem first and the database second; everything
//! here is therefore safe to retry after a crash between the two steps.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;

use crate::naming;

/// Metadata of one on-disk entry, read without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl FileStat {
    /// Build from `std::fs::Metadata`.
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH));
        Self {
            is_dir: meta.is_dir(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified,
        }
    }
}

fn storage_error(context: impl Into<String>, err: io::Error) -> AppError {
    AppError::with_source(ErrorKind::Storage, format!("{}: {err}", context.into()), err)
}

/// Absolute path of a file given its volume path and the names from the
/// root down to the file itself.
pub fn resolve<S: AsRef<str>>(volume_path: &Path, components: &[S]) -> PathBuf {
    components
        .iter()
        .fold(volume_path.to_path_buf(), |path, name| path.join(name.as_ref()))
}

/// Stat `path` without following symlinks.
pub async fn stat(path: &Path) -> AppResult<FileStat> {
    let meta = fs::symlink_metadata(path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            AppError::not_found(format!("Not found on disk: {}", path.display()))
        } else {
            storage_error(format!("Failed to stat {}", path.display()), e)
        }
    })?;
    Ok(FileStat::from_metadata(&meta))
}

/// Create a directory. An existing directory at `path` is adopted.
pub async fn create_dir(path: &Path) -> AppResult<()> {
    match fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(AppError::conflict(format!(
            "A file already exists at {}",
            path.display()
        ))),
        Err(e) => Err(storage_error(
            format!("Failed to create folder {}", path.display()),
            e,
        )),
    }
}

/// Move `from` to `to`, copying across devices when rename is not possible.
pub async fn move_path(from: &Path, to: &Path) -> AppResult<()> {
    match fs::rename(from, to).await {
        Ok(()) => {
            debug!(from = %from.display(), to = %to.display(), "Renamed path");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            let (src, dst) = (from.to_path_buf(), to.to_path_buf());
            tokio::task::spawn_blocking(move || copy_recursive(&src, &dst))
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Internal, "Copy task panicked", e))?
                .map_err(|e| storage_error(format!("Failed to copy {}", from.display()), e))?;
            remove_path(from).await?;
            debug!(from = %from.display(), to = %to.display(), "Moved path across devices");
            Ok(())
        }
        Err(e) => Err(storage_error(
            format!("Failed to move {} to {}", from.display(), to.display()),
            e,
        )),
    }
}

/// Move `from` to `to` unless something already exists at `to`.
///
/// The destination is reserved with an exclusive create before the move, so
/// a concurrent writer picking the same name gets `Conflict` instead of
/// silently replacing it.
pub async fn move_path_new(from: &Path, to: &Path) -> AppResult<()> {
    let meta = fs::symlink_metadata(from)
        .await
        .map_err(|e| storage_error(format!("Failed to stat {}", from.display()), e))?;

    let reserved = if meta.is_dir() {
        fs::create_dir(to).await
    } else {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(to)
            .await
            .map(drop)
    };
    match reserved {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(AppError::conflict(format!(
                "An entry already exists at {}",
                to.display()
            )));
        }
        Err(e) => return Err(storage_error(format!("Failed to reserve {}", to.display()), e)),
    }

    if let Err(e) = move_path(from, to).await {
        remove_path_best_effort(to).await;
        return Err(e);
    }
    Ok(())
}

/// Move `from` into `dir` under `desired`, or under the first free
/// `stem (n)ext` variant when that name is taken on disk or in `taken`.
/// Returns the name used.
pub async fn move_unique(
    from: &Path,
    dir: &Path,
    desired: &str,
    taken: &HashSet<String>,
) -> AppResult<String> {
    let mut lost = HashSet::new();
    loop {
        let name = naming::unique_name(desired, |candidate| {
            taken.contains(candidate) || lost.contains(candidate) || dir.join(candidate).exists()
        });
        match move_path_new(from, &dir.join(&name)).await {
            Ok(()) => return Ok(name),
            Err(e) if e.kind == ErrorKind::Conflict => {
                debug!(name = %name, dir = %dir.display(), "Name taken concurrently, retrying");
                lost.insert(name);
            }
            Err(e) => return Err(e),
        }
    }
}

fn copy_recursive(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove a file or a directory tree. A missing path is not an error.
pub async fn remove_path(path: &Path) -> AppResult<()> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(storage_error(format!("Failed to stat {}", path.display()), e)),
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(storage_error(format!("Failed to remove {}", path.display()), e)),
    }
}

/// Like [`remove_path`] but only logs failures.
pub async fn remove_path_best_effort(path: &Path) {
    if let Err(e) = remove_path(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove path");
    }
}

/// Fresh path inside the staging directory, creating the directory if needed.
pub async fn staging_path(temp_dir: &Path) -> AppResult<PathBuf> {
    fs::create_dir_all(temp_dir)
        .await
        .map_err(|e| storage_error(format!("Failed to create {}", temp_dir.display()), e))?;
    Ok(temp_dir.join(format!("upload-{}", Uuid::new_v4())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let path = resolve(Path::new("/srv/v"), &["a", "b.txt"]);
        assert_eq!(path, PathBuf::from("/srv/v/a/b.txt"));
        let root = resolve::<&str>(Path::new("/srv/v"), &[]);
        assert_eq!(root, PathBuf::from("/srv/v"));
    }

    #[tokio::test]
    async fn test_create_dir_adopts_existing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sub");
        create_dir(&target).await.unwrap();
        create_dir(&target).await.unwrap();

        std::fs::write(dir.path().join("file"), b"x").unwrap();
        let err = create_dir(&dir.path().join("file")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_move_and_remove_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("nested/a.txt"), b"hello").unwrap();

        let dst = dir.path().join("dst");
        move_path(&src, &dst).await.unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(dst.join("nested/a.txt")).unwrap(), b"hello");

        remove_path(&dst).await.unwrap();
        assert!(!dst.exists());
        remove_path(&dst).await.unwrap();
    }

    #[tokio::test]
    async fn test_move_path_new_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("incoming");
        let dst = dir.path().join("a.txt");
        std::fs::write(&src, b"new").unwrap();
        std::fs::write(&dst, b"old").unwrap();

        let err = move_path_new(&src, &dst).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(std::fs::read(&dst).unwrap(), b"old");
        assert!(src.exists());

        let free = dir.path().join("b.txt");
        move_path_new(&src, &free).await.unwrap();
        assert_eq!(std::fs::read(&free).unwrap(), b"new");
        assert!(!src.exists());
    }

    #[tokio::test]
    async fn test_move_path_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("album");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("cover.jpg"), b"img").unwrap();

        let dst = dir.path().join("moved");
        move_path_new(&src, &dst).await.unwrap();
        assert_eq!(std::fs::read(dst.join("cover.jpg")).unwrap(), b"img");

        std::fs::create_dir_all(&src).unwrap();
        let err = move_path_new(&src, &dst).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(dst.join("cover.jpg").exists());
    }

    #[tokio::test]
    async fn test_move_unique_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"first").unwrap();
        let staged = dir.path().join("staged");
        std::fs::write(&staged, b"second").unwrap();

        let taken: HashSet<String> = ["a (1).txt".to_string()].into_iter().collect();
        let name = move_unique(&staged, dir.path(), "a.txt", &taken).await.unwrap();

        assert_eq!(name, "a (2).txt");
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.path().join("a (2).txt")).unwrap(), b"second");
    }

    #[test]
    fn test_copy_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("x/y")).unwrap();
        std::fs::write(src.join("x/y/z.bin"), [1u8, 2, 3]).unwrap();
        copy_recursive(&src, &dir.path().join("copy")).unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("copy/x/y/z.bin")).unwrap(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_stat() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hi").unwrap();
        let stat_file = stat(&file).await.unwrap();
        assert!(!stat_file.is_dir);
        assert_eq!(stat_file.size, 2);
        let stat_dir = stat(dir.path()).await.unwrap();
        assert!(stat_dir.is_dir);
        assert_eq!(stat_dir.size, 0);
    }
}
