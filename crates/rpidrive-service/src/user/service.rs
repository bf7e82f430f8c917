//! User administration and credential checks.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use rpidrive_auth::PasswordHasher;
use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_database::repositories::user::UserRepository;
use rpidrive_entity::activity::ActivityKind;
use rpidrive_entity::user::{CreateUser, UpdateUser, User};

use crate::activity::ActivityLogger;
use crate::context::RequestContext;
use crate::lookup::EntityLookup;

/// Message for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid username/password";

/// Fields accepted when creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Fields accepted when updating a user; absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

/// User accounts.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<UserRepository>,
    lookup: EntityLookup,
    hasher: Arc<PasswordHasher>,
    activity: ActivityLogger,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<UserRepository>,
        lookup: EntityLookup,
        hasher: Arc<PasswordHasher>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            users,
            lookup,
            hasher,
            activity,
        }
    }

    /// Check credentials and record the login.
    ///
    /// Unknown users, wrong passwords and inactive accounts all fail with the
    /// same `Authentication` error.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::authentication(INVALID_CREDENTIALS))?;

        if !self.hasher.verify_password(password, &user.password_hash)? || !user.can_login() {
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        }

        self.users.touch_last_login(user.id).await?;
        self.lookup.forget_user(user.id).await;
        info!(user_id = user.id, username = %user.username, "User logged in");
        Ok(user)
    }

    /// Active user by ID for session resolution.
    pub async fn active_user(&self, id: i32) -> AppResult<User> {
        match self.lookup.user(id).await? {
            Some(user) if user.can_login() => Ok(user),
            _ => Err(AppError::authentication("User not found or inactive")),
        }
    }

    /// All users. Superuser only.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<User>> {
        ctx.require_superuser()?;
        self.users.list().await
    }

    /// One user; callers may read themselves, superusers anyone.
    pub async fn get(&self, ctx: &RequestContext, id: i32) -> AppResult<User> {
        if id != ctx.user_id() && !ctx.is_superuser() {
            return Err(AppError::authorization("Cannot view other users"));
        }
        self.lookup
            .user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Create a user. Superuser only.
    pub async fn create(&self, ctx: &RequestContext, req: CreateUserRequest) -> AppResult<User> {
        ctx.require_superuser()?;
        let user = self.create_unchecked(req).await?;
        self.activity
            .record(
                Some(ctx.user_id()),
                ActivityKind::CreateUser,
                json!({ "id": user.id, "username": user.username }),
            )
            .await;
        Ok(user)
    }

    /// Create a user without a caller; used by the CLI and the bootstrap.
    pub async fn create_unchecked(&self, req: CreateUserRequest) -> AppResult<User> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }
        if req.password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        let password_hash = self.hasher.hash_password(&req.password)?;
        let user = self
            .users
            .create(&CreateUser {
                username,
                email: req.email.trim().to_string(),
                password_hash,
                is_superuser: req.is_superuser,
                is_active: req.is_active,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Update a user. Superuser only.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i32,
        req: UpdateUserRequest,
    ) -> AppResult<User> {
        ctx.require_superuser()?;
        if id == ctx.user_id() && (req.is_superuser == Some(false) || req.is_active == Some(false))
        {
            return Err(AppError::invalid_operation(
                "Cannot revoke your own superuser or active flag",
            ));
        }

        let changed: Vec<&str> = [
            req.email.as_ref().map(|_| "email"),
            req.password.as_ref().map(|_| "password"),
            req.is_superuser.map(|_| "is_superuser"),
            req.is_active.map(|_| "is_active"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let user = self.update_unchecked(id, req).await?;
        self.activity
            .record(
                Some(ctx.user_id()),
                ActivityKind::UpdateUser,
                json!({ "id": id, "fields": changed }),
            )
            .await;
        Ok(user)
    }

    /// Update without a caller; used by the CLI.
    pub async fn update_unchecked(&self, id: i32, req: UpdateUserRequest) -> AppResult<User> {
        let password_hash = match req.password.as_deref() {
            Some("") => return Err(AppError::validation("Password must not be empty")),
            Some(password) => Some(self.hasher.hash_password(password)?),
            None => None,
        };
        let update = UpdateUser {
            email: req.email.map(|e| e.trim().to_string()),
            password_hash,
            is_superuser: req.is_superuser,
            is_active: req.is_active,
        };

        let user = if update.is_empty() {
            self.users.find_by_id(id).await?
        } else {
            self.users.update(id, &update).await?
        }
        .ok_or_else(|| AppError::not_found("User not found"))?;

        self.lookup.forget_user(id).await;
        info!(user_id = id, "User updated");
        Ok(user)
    }

    /// Set a password by username; used by the CLI.
    pub async fn set_password(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))?;
        self.update_unchecked(
            user.id,
            UpdateUserRequest {
                password: Some(password.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a user. Superuser only; a superuser cannot delete themselves.
    pub async fn delete(&self, ctx: &RequestContext, id: i32) -> AppResult<()> {
        ctx.require_superuser()?;
        if id == ctx.user_id() {
            return Err(AppError::invalid_operation("Cannot delete yourself"));
        }
        if !self.users.delete(id).await? {
            return Err(AppError::not_found("User not found"));
        }
        self.lookup.forget_user(id).await;
        self.activity
            .record(
                Some(ctx.user_id()),
                ActivityKind::DeleteUser,
                json!({ "id": id }),
            )
            .await;
        info!(user_id = id, deleted_by = ctx.user_id(), "User deleted");
        Ok(())
    }

    /// Every user, for the CLI.
    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    /// Whether any superuser exists.
    pub async fn superuser_exists(&self) -> AppResult<bool> {
        self.users.superuser_exists().await
    }
}
