//! Session lifecycle: create on login, validate per request, destroy on logout.
//!
//! The signed token proves who the session belongs to; the `session.<sid>`
//! key in the shared store proves it has not been logged out.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use rpidrive_cache::CacheManager;
use rpidrive_cache::keys;
use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_core::traits::cache::CacheProvider;

use crate::jwt::{Claims, JwtCodec};

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// Signed token placed in the session cookie.
    pub token: String,
    /// Session ID.
    pub session_id: Uuid,
    /// Expiry of token and session key.
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    codec: JwtCodec,
    cache: CacheManager,
    ttl: Duration,
}

impl SessionManager {
    /// Creates a session manager.
    pub fn new(secret: &str, cache: CacheManager, ttl_seconds: u64) -> Self {
        Self {
            codec: JwtCodec::new(secret),
            cache,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Lifetime of a session.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user_id`.
    pub async fn create(&self, user_id: i32) -> AppResult<SessionToken> {
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AppError::configuration(format!("Invalid session lifetime: {e}")))?;
        let expires_at = now + ttl;

        let claims = Claims::new(user_id, session_id, now.timestamp(), expires_at.timestamp());
        let token = self.codec.encode(&claims)?;

        self.cache
            .set(&keys::session(session_id), &user_id.to_string(), self.ttl)
            .await?;

        debug!(user_id, session_id = %session_id, "Session created");
        Ok(SessionToken {
            token,
            session_id,
            expires_at,
        })
    }

    /// Validate a token and check the session is still live.
    pub async fn validate(&self, token: &str) -> AppResult<Claims> {
        let claims = self.codec.decode(token)?;
        let stored = self.cache.get(&keys::session(claims.sid)).await?;
        match stored {
            Some(user) if user == claims.sub => Ok(claims),
            _ => Err(AppError::authentication("Session expired or logged out")),
        }
    }

    /// Destroy the session referenced by `token`. Invalid tokens are ignored.
    pub async fn destroy(&self, token: &str) -> AppResult<()> {
        if let Ok(claims) = self.codec.decode(token) {
            self.cache.delete(&keys::session(claims.sid)).await?;
            debug!(user_id = %claims.sub, session_id = %claims.sid, "Session destroyed");
        }
        Ok(())
    }
}
