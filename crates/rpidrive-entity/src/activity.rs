//! Audit trail of administrative actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Kind of recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    CreateVolume,
    UpdateVolume,
    DeleteVolume,
    IndexVolume,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl ActivityKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateVolume => "CREATE_VOLUME",
            Self::UpdateVolume => "UPDATE_VOLUME",
            Self::DeleteVolume => "DELETE_VOLUME",
            Self::IndexVolume => "INDEX_VOLUME",
            Self::CreateUser => "CREATE_USER",
            Self::UpdateUser => "UPDATE_USER",
            Self::DeleteUser => "DELETE_USER",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: i64,
    /// Acting user; null once the user is deleted.
    pub actor_id: Option<i32>,
    pub kind: ActivityKind,
    /// Free-form description of the change.
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
