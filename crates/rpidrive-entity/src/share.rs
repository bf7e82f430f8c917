//! Public file links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A short-lived unauthenticated handle to one file.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicFileLink {
    /// Link key handed out to clients.
    pub id: Uuid,
    /// Linked file.
    pub file_id: Uuid,
    /// Instant after which the link is logically absent.
    pub expire_time: DateTime<Utc>,
}

impl PublicFileLink {
    /// A link is valid strictly before its expiry time.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_time > now
    }

    /// Check validity against the current time.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}
