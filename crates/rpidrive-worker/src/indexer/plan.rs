//! Diffing one folder's database rows against its disk listing.

use std::collections::HashMap;

use uuid::Uuid;

use rpidrive_entity::file::{File, FileKind};

use super::scan::DiskEntry;

/// Changes needed to make one folder's rows match the disk.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FolderPlan {
    /// Entries with no row yet.
    pub insert: Vec<DiskEntry>,
    /// Rows whose size or modification time changed.
    pub update: Vec<(Uuid, DiskEntry)>,
    /// Rows whose kind flipped; the old subtree is dropped and re-inserted.
    pub replace: Vec<(Uuid, DiskEntry)>,
    /// Rows with no entry on disk.
    pub remove: Vec<Uuid>,
    /// Existing folder rows kept as they are, to descend into.
    pub keep_folders: Vec<(Uuid, String)>,
}

impl FolderPlan {
    /// Whether the folder is already in sync.
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty()
            && self.update.is_empty()
            && self.replace.is_empty()
            && self.remove.is_empty()
    }

    /// IDs to delete before inserting anything.
    pub fn deletions(&self) -> Vec<Uuid> {
        self.remove
            .iter()
            .copied()
            .chain(self.replace.iter().map(|(id, _)| *id))
            .collect()
    }
}

fn kind_of(entry: &DiskEntry) -> FileKind {
    if entry.is_dir() {
        FileKind::Folder
    } else {
        FileKind::File
    }
}

/// Compare the rows under a folder with what is on disk.
///
/// Modification times are compared at second precision; the database keeps
/// microseconds while some filesystems report nanoseconds.
pub fn plan_folder(existing: &[File], on_disk: &[DiskEntry]) -> FolderPlan {
    let mut rows: HashMap<&str, &File> = existing.iter().map(|f| (f.name.as_str(), f)).collect();
    let mut plan = FolderPlan::default();

    for entry in on_disk {
        match rows.remove(entry.name.as_str()) {
            None => plan.insert.push(entry.clone()),
            Some(row) if row.kind != kind_of(entry) => {
                plan.replace.push((row.id, entry.clone()));
            }
            Some(row) if row.is_folder() => plan.keep_folders.push((row.id, row.name.clone())),
            Some(row) => {
                let size = i64::try_from(entry.stat.size).unwrap_or(i64::MAX);
                if row.size != size
                    || row.last_modified.timestamp() != entry.stat.modified.timestamp()
                {
                    plan.update.push((row.id, entry.clone()));
                }
            }
        }
    }

    let mut stale: Vec<&File> = rows.into_values().collect();
    stale.sort_by(|a, b| a.name.cmp(&b.name));
    plan.remove = stale.into_iter().map(|f| f.id).collect();
    plan
}
