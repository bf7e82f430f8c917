//! Playlists of media files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named, ordered collection owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Playlist {
    pub id: i32,
    /// Owning user.
    pub owner_id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Membership of a file in a playlist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlaylistFile {
    pub id: i32,
    pub playlist_id: i32,
    pub file_id: Uuid,
    /// Position within the playlist, ascending.
    pub sequence: i32,
}
