//! File tree operations.

pub mod compress;
pub mod download;
pub mod service;
pub mod transfer;
pub mod upload;

pub use compress::CompressRequest;
pub use download::DownloadTarget;
pub use service::{FileDetails, FileFields, FileService, resolve_disk_path};
pub use transfer::{MoveRequest, MoveStrategy};
pub use upload::StagedUpload;
