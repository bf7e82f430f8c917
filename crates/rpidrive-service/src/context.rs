//! The acting caller of a request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_entity::user::User;

/// Who is acting, passed explicitly into every service call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The authenticated user.
    pub user: Arc<User>,
    /// The current session ID.
    pub session_id: Uuid,
    /// Client address the request came from.
    pub ip_address: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user: User, session_id: Uuid, ip_address: impl Into<String>) -> Self {
        Self {
            user: Arc::new(user),
            session_id,
            ip_address: ip_address.into(),
            request_time: Utc::now(),
        }
    }

    /// The acting user's ID.
    pub fn user_id(&self) -> i32 {
        self.user.id
    }

    /// Whether the acting user is a superuser.
    pub fn is_superuser(&self) -> bool {
        self.user.is_superuser
    }

    /// Fail with `Authorization` unless the caller is a superuser.
    pub fn require_superuser(&self) -> AppResult<()> {
        if self.is_superuser() {
            Ok(())
        } else {
            Err(AppError::authorization("Superuser privileges required"))
        }
    }
}
