//! File tree entities.

pub mod model;

pub use model::{CreateFile, File, FileKind, FileRef};
