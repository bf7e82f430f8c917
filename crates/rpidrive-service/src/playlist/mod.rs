//! Per-user playlists.

pub mod service;

pub use service::{PlaylistAction, PlaylistDetails, PlaylistService};
