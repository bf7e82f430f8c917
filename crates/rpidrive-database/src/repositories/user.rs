//! User repository implementation.

use chrono::Utc;
use sqlx::PgPool;

use rpidrive_core::result::AppResult;
use rpidrive_entity::user::{CreateUser, UpdateUser, User};

use crate::error::db_error;

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user", e))
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user by username", e))
    }

    /// List all users ordered by ID.
    pub async fn list(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list users", e))
    }

    /// Create a new user.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, is_superuser, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.is_superuser)
        .bind(data.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create user", e))
    }

    /// Apply a partial update. Returns `None` when the user does not exist.
    pub async fn update(&self, id: i32, data: &UpdateUser) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET \
             email = COALESCE($2, email), \
             password_hash = COALESCE($3, password_hash), \
             is_superuser = COALESCE($4, is_superuser), \
             is_active = COALESCE($5, is_active) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.is_superuser)
        .bind(data.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update user", e))
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update last login", e))?;
        Ok(())
    }

    /// Delete a user. Returns whether a row was removed.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete user", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether at least one superuser exists.
    pub async fn superuser_exists(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE is_superuser)")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to check for superuser", e))
    }
}
