//! Claims carried by the session cookie.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rpidrive_core::error::AppError;

/// JWT claims payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID in decimal.
    pub sub: String,
    /// Session ID; the session is live while `session.<sid>` exists.
    pub sid: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Builds claims for `user_id`'s session `sid`.
    pub fn new(user_id: i32, sid: Uuid, iat: i64, exp: i64) -> Self {
        Self {
            sub: user_id.to_string(),
            sid,
            iat,
            exp,
        }
    }

    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Result<i32, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::authentication("Invalid session subject"))
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
