//! Byte-range reads for downloads.
//!
//! [`RangeRequest::resolve`] turns a `Range:` header into one of three
//! outcomes; [`open_stream`] seeks once and yields fixed-size chunks until
//! the range is exhausted. The file handle lives inside the stream, so it is
//! closed whenever the stream is dropped, including on client disconnect.

use std::io::SeekFrom;
use std::path::Path;

use http_range::{HttpRange, HttpRangeParseError};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;

/// Size of each streamed chunk.
pub const CHUNK_SIZE: usize = 8192;

/// Stream of file chunks bounded to a range.
pub type FileStream = ReaderStream<Take<File>>;

/// Inclusive byte span of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub length: u64,
}

impl ByteRange {
    /// The whole file.
    pub fn full(size: u64) -> Self {
        Self {
            start: 0,
            length: size,
        }
    }

    /// Last byte offset, inclusive.
    pub fn last(&self) -> u64 {
        (self.start + self.length).saturating_sub(1)
    }

    /// `Content-Range` header value.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.last(), size)
    }
}

/// Outcome of resolving a `Range:` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range; serve everything with 200.
    Full,
    /// Serve one span with 206.
    Partial(ByteRange),
    /// Respond 416 with `Content-Range: bytes */<size>`.
    Unsatisfiable,
}

impl RangeRequest {
    /// Resolve the header value (if any) against `size`.
    ///
    /// Malformed headers and multi-range requests fall back to the full body.
    pub fn resolve(header: Option<&str>, size: u64) -> Self {
        let Some(header) = header else {
            return Self::Full;
        };
        if size == 0 {
            return Self::Unsatisfiable;
        }
        match HttpRange::parse(header, size) {
            Ok(ranges) => match ranges.as_slice() {
                [range] => Self::Partial(ByteRange {
                    start: range.start,
                    length: range.length,
                }),
                _ => Self::Full,
            },
            Err(HttpRangeParseError::NoOverlap) => Self::Unsatisfiable,
            Err(HttpRangeParseError::InvalidRange) => Self::Full,
        }
    }

    /// `Content-Range` value for a 416 response.
    pub fn unsatisfied_content_range(size: u64) -> String {
        format!("bytes */{size}")
    }
}

/// Open `path`, seek to `range.start` and stream `range.length` bytes.
pub async fn open_stream(path: &Path, range: ByteRange) -> AppResult<FileStream> {
    let mut file = File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("File not found on disk: {}", path.display()))
        } else {
            AppError::with_source(
                rpidrive_core::ErrorKind::Storage,
                format!("Failed to open file: {}", path.display()),
                e,
            )
        }
    })?;
    if range.start > 0 {
        file.seek(SeekFrom::Start(range.start)).await?;
    }
    Ok(ReaderStream::with_capacity(
        file.take(range.length),
        CHUNK_SIZE,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_no_header_is_full() {
        assert_eq!(RangeRequest::resolve(None, 100), RangeRequest::Full);
    }

    #[test]
    fn test_closed_range() {
        let RangeRequest::Partial(range) = RangeRequest::resolve(Some("bytes=0-99"), 10_000) else {
            panic!("expected partial");
        };
        assert_eq!(range, ByteRange { start: 0, length: 100 });
        assert_eq!(range.content_range(10_000), "bytes 0-99/10000");
    }

    #[test]
    fn test_open_ended_range() {
        let RangeRequest::Partial(range) = RangeRequest::resolve(Some("bytes=9990-"), 10_000) else {
            panic!("expected partial");
        };
        assert_eq!(range.length, 10);
        assert_eq!(range.content_range(10_000), "bytes 9990-9999/10000");
    }

    #[test]
    fn test_suffix_range() {
        let RangeRequest::Partial(range) = RangeRequest::resolve(Some("bytes=-5"), 20) else {
            panic!("expected partial");
        };
        assert_eq!(range, ByteRange { start: 15, length: 5 });
    }

    #[test]
    fn test_start_past_end_is_unsatisfiable() {
        assert_eq!(
            RangeRequest::resolve(Some("bytes=10000-"), 10_000),
            RangeRequest::Unsatisfiable
        );
        assert_eq!(
            RangeRequest::resolve(Some("bytes=0-"), 0),
            RangeRequest::Unsatisfiable
        );
    }

    #[test]
    fn test_garbage_is_full() {
        assert_eq!(RangeRequest::resolve(Some("pages=1-2"), 10), RangeRequest::Full);
    }

    #[tokio::test]
    async fn test_partition_reassembles_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let content: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        let mut rebuilt = Vec::new();
        for header in ["bytes=0-8999", "bytes=9000-9000", "bytes=9001-"] {
            let RangeRequest::Partial(range) =
                RangeRequest::resolve(Some(header), content.len() as u64)
            else {
                panic!("expected partial for {header}");
            };
            let mut stream = open_stream(&path, range).await.unwrap();
            let mut part = Vec::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.unwrap();
                assert!(chunk.len() <= CHUNK_SIZE);
                part.extend_from_slice(&chunk);
            }
            assert_eq!(part.len() as u64, range.length);
            rebuilt.extend(part);
        }
        assert_eq!(rebuilt, content);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = open_stream(Path::new("/definitely/not/here"), ByteRange::full(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, rpidrive_core::ErrorKind::NotFound);
    }
}
