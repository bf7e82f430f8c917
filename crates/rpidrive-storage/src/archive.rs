//! Zip archive writer for compress jobs.
//!
//! Synchronous; run it on the blocking pool. Progress is reported in whole
//! percent of source bytes and the callback may stop the archive early.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;

const COPY_BUFFER: usize = 64 * 1024;
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// A file or folder to place at the archive top level under `name`.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    pub path: PathBuf,
    pub name: String,
}

/// How an archive run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Completed { bytes: u64 },
    Cancelled,
}

enum Entry {
    Dir(String),
    File(PathBuf, String, u64),
}

fn zip_error(err: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Storage, format!("Zip error: {err}"), err)
}

fn collect(sources: &[ArchiveSource]) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for source in sources {
        for entry in WalkDir::new(&source.path).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            let relative = entry
                .path()
                .strip_prefix(&source.path)
                .map_err(io::Error::other)?;
            let mut name = source.name.clone();
            for part in relative.components() {
                name.push('/');
                name.push_str(&part.as_os_str().to_string_lossy());
            }
            let file_type = entry.file_type();
            if file_type.is_dir() {
                entries.push(Entry::Dir(name));
            } else if file_type.is_file() {
                let size = entry.metadata().map_err(io::Error::other)?.len();
                entries.push(Entry::File(entry.into_path(), name, size));
            }
        }
    }
    Ok(entries)
}

/// Write `sources` into a new zip at `dest`.
///
/// `on_progress` is called with 0..=100 whenever the percentage grows;
/// returning `false` stops the run with [`ArchiveOutcome::Cancelled`] and
/// leaves the partial file for the caller to remove.
pub fn write_zip(
    sources: &[ArchiveSource],
    dest: &Path,
    mut on_progress: impl FnMut(u8) -> bool,
) -> AppResult<ArchiveOutcome> {
    let entries = collect(sources)?;
    let total: u64 = entries
        .iter()
        .map(|e| match e {
            Entry::File(_, _, size) => *size,
            Entry::Dir(_) => 0,
        })
        .sum();

    let mut zip = ZipWriter::new(File::create(dest)?);

    let mut done = 0u64;
    let mut reported = 0u8;
    if !on_progress(0) {
        return Ok(ArchiveOutcome::Cancelled);
    }

    let mut buffer = vec![0u8; COPY_BUFFER];
    for entry in entries {
        match entry {
            Entry::Dir(name) => zip
                .add_directory(name, SimpleFileOptions::default())
                .map_err(zip_error)?,
            Entry::File(path, name, size) => {
                let options = SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .large_file(size >= LARGE_FILE_THRESHOLD);
                zip.start_file(name, options).map_err(zip_error)?;
                let mut input = File::open(&path)?;
                loop {
                    let read = input.read(&mut buffer)?;
                    if read == 0 {
                        break;
                    }
                    zip.write_all(&buffer[..read])?;
                    done += read as u64;

                    let percent = percent_of(done, total);
                    if percent > reported {
                        reported = percent;
                        if !on_progress(percent) {
                            return Ok(ArchiveOutcome::Cancelled);
                        }
                    }
                }
            }
        }
    }

    let mut file = zip.finish().map_err(zip_error)?;
    file.flush()?;
    if reported < 100 {
        on_progress(100);
    }
    Ok(ArchiveOutcome::Completed { bytes: done })
}

fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.saturating_mul(100) / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, Vec<ArchiveSource>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), vec![b'a'; 5000]).unwrap();
        std::fs::create_dir_all(dir.path().join("album/inner")).unwrap();
        std::fs::write(dir.path().join("album/inner/b.txt"), vec![b'b'; 5000]).unwrap();
        let sources = vec![
            ArchiveSource {
                path: dir.path().join("a.txt"),
                name: "a.txt".into(),
            },
            ArchiveSource {
                path: dir.path().join("album"),
                name: "album".into(),
            },
        ];
        (dir, sources)
    }

    #[test]
    fn test_writes_files_and_folders() {
        let (dir, sources) = fixture();
        let dest = dir.path().join("out.zip");
        let mut seen = Vec::new();
        let outcome = write_zip(&sources, &dest, |p| {
            seen.push(p);
            true
        })
        .unwrap();

        assert_eq!(outcome, ArchiveOutcome::Completed { bytes: 10_000 });
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["a.txt", "album/", "album/inner/", "album/inner/b.txt"]
        );
        let mut content = String::new();
        archive
            .by_name("album/inner/b.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.len(), 5000);
    }

    #[test]
    fn test_cancel_stops_early() {
        let (dir, sources) = fixture();
        let dest = dir.path().join("out.zip");
        let outcome = write_zip(&sources, &dest, |p| p < 10).unwrap();
        assert_eq!(outcome, ArchiveOutcome::Cancelled);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 0), 100);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(3, 3), 100);
    }
}
