//! Picture thumbnails.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;

/// Longest edge of a generated thumbnail.
pub const THUMBNAIL_SIZE: u32 = 256;

/// Decode the picture at `path` and return a PNG thumbnail bounded by
/// `max_size` on both edges. Decoding runs on the blocking pool.
pub async fn generate(path: &Path, max_size: u32) -> AppResult<Vec<u8>> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || render(&path, max_size))
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Thumbnail task panicked", e))?
}

fn render(path: &Path, max_size: u32) -> AppResult<Vec<u8>> {
    let image = image::open(path).map_err(|e| {
        AppError::with_source(
            ErrorKind::Validation,
            format!("Cannot decode picture {}", path.display()),
            e,
        )
    })?;
    let thumbnail = image.thumbnail(max_size, max_size);
    let mut out = Cursor::new(Vec::new());
    thumbnail
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to encode thumbnail", e))?;
    tracing::debug!(path = %path.display(), max_size, "Generated thumbnail");
    Ok(out.into_inner())
}
