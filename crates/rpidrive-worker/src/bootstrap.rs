//! First-start superuser creation.

use std::path::Path;

use tracing::{info, warn};

use rpidrive_auth::{generate_password, generate_token};
use rpidrive_core::result::AppResult;
use rpidrive_entity::user::User;
use rpidrive_service::UserService;
use rpidrive_service::user::CreateUserRequest;

const USERNAME_SUFFIX_LEN: usize = 6;
const PASSWORD_LEN: usize = 16;

/// Credentials of the generated account.
#[derive(Debug, Clone)]
pub struct BootstrapCredentials {
    pub username: String,
    pub password: String,
}

impl BootstrapCredentials {
    /// Generate a fresh `admin-xxxxxx` account.
    pub fn generate() -> Self {
        Self {
            username: format!("admin-{}", generate_token(USERNAME_SUFFIX_LEN)),
            password: generate_password(PASSWORD_LEN),
        }
    }

    /// Contents of the marker file.
    pub fn render(&self) -> String {
        format!("username: {}\npassword: {}\n", self.username, self.password)
    }
}

/// Create a superuser when none exists and record its credentials in
/// `init_file`. Returns the new user, or `None` when one already exists.
pub async fn ensure_superuser(users: &UserService, init_file: &Path) -> AppResult<Option<User>> {
    if users.superuser_exists().await? {
        return Ok(None);
    }

    let credentials = BootstrapCredentials::generate();
    let user = users
        .create_unchecked(CreateUserRequest {
            username: credentials.username.clone(),
            email: String::new(),
            password: credentials.password.clone(),
            is_superuser: true,
            is_active: true,
        })
        .await?;

    let content = credentials.render();
    if let Some(dir) = init_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    match tokio::fs::write(init_file, &content).await {
        Ok(()) => info!(path = %init_file.display(), "Superuser credentials written"),
        Err(e) => warn!(path = %init_file.display(), error = %e, "Failed to write credentials file"),
    }
    info!(user_id = user.id, "Superuser created\n{content}");
    Ok(Some(user))
}
