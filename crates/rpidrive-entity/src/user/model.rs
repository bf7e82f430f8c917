//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Serial user identifier.
    pub id: i32,
    /// Unique login name.
    pub username: String,
    /// Email address, possibly empty.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Implicit ADMIN on every volume.
    pub is_superuser: bool,
    /// Inactive users cannot log in.
    pub is_active: bool,
    /// Last successful login time.
    pub last_login: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check if the user can log in right now.
    pub fn can_login(&self) -> bool {
        self.is_active
    }

    /// Public projection of the user, never carrying the hash.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_superuser: self.is_superuser,
            is_active: self.is_active,
            last_login: self.last_login,
        }
    }
}

/// User fields returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Superuser flag.
    pub is_superuser: bool,
    /// Active flag.
    pub is_active: bool,
}

/// Partial update of a user; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.is_superuser.is_none()
            && self.is_active.is_none()
    }
}
