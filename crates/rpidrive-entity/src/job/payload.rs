//! Kind-specific job payloads stored in `jobs.data`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a `ZIP` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipPayload {
    /// Files and folders to archive.
    pub files: Vec<Uuid>,
    /// Folder receiving the archive.
    pub compress_dir: Uuid,
    /// Archive file name, ending in `.zip`.
    pub compress_name: String,
}

/// Payload of an `INDEX` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPayload {
    pub volume_id: Uuid,
}
