//! # rpidrive-storage
//!
//! Everything that touches the host filesystem on behalf of a volume.
//!
//! - `naming` — name sanitization and collision-free name generation
//! - `media` — extension based media classification
//! - `range` — `Range:` header resolution and bounded file streams
//! - `fs` — moves, removals and staging for volume trees
//! - `disk` — space figures for the disk holding a volume
//! - `archive` — zip archive writer with progress reporting
//! - `thumbnail` — picture thumbnails

pub mod archive;
pub mod disk;
pub mod fs;
pub mod media;
pub mod naming;
pub mod range;
pub mod thumbnail;

pub use media::MediaKind;
pub use range::{ByteRange, RangeRequest};
