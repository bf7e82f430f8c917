//! File entity model.
//!
//! Files form one tree per volume. The root has a null parent and an empty
//! name; every other row hangs off a `FOLDER` in the same volume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    Folder,
    File,
}

impl FileKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "FOLDER",
            Self::File => "FILE",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file or folder inside a volume.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// Owning volume.
    pub volume_id: Uuid,
    /// Parent folder; `None` only for the volume root.
    pub parent_id: Option<Uuid>,
    /// Name within the parent, empty for the root.
    pub name: String,
    /// Folder or file.
    pub kind: FileKind,
    /// Byte count; always 0 for folders.
    pub size: i64,
    /// Filesystem modification time at the last index or write.
    pub last_modified: DateTime<Utc>,
    /// MIME type.
    pub media_type: String,
    /// Opaque per-type metadata.
    pub metadata: serde_json::Value,
}

impl File {
    /// Whether this is the volume root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether this row is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }

    /// Short `{id, name}` reference.
    pub fn to_ref(&self) -> FileRef {
        FileRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Compact reference used in ancestor chains and summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileRef {
    pub id: Uuid,
    pub name: String,
}

/// Data required to insert a file row.
#[derive(Debug, Clone)]
pub struct CreateFile {
    pub volume_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub kind: FileKind,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
    pub media_type: String,
}

impl CreateFile {
    /// A new folder under `parent_id`.
    pub fn folder(volume_id: Uuid, parent_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            volume_id,
            parent_id: Some(parent_id),
            name: name.into(),
            kind: FileKind::Folder,
            size: 0,
            last_modified: Utc::now(),
            media_type: String::new(),
        }
    }

    /// The root row of a freshly created volume.
    pub fn root(volume_id: Uuid) -> Self {
        Self {
            volume_id,
            parent_id: None,
            name: String::new(),
            kind: FileKind::Folder,
            size: 0,
            last_modified: Utc::now(),
            media_type: String::new(),
        }
    }
}
