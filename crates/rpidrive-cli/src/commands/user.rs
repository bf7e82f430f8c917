//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use rpidrive_cache::CacheManager;
use rpidrive_core::config::AppConfig;
use rpidrive_core::error::AppError;
use rpidrive_entity::user::User;
use rpidrive_service::user::CreateUserRequest;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List all users
    List,
    /// Create a user
    Create {
        /// Username
        username: String,
        /// Email address
        #[arg(short, long, default_value = "")]
        email: String,
        /// Grant implicit ADMIN on every volume
        #[arg(long)]
        superuser: bool,
        /// Password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Replace a user's password
    SetPassword {
        /// Username
        username: String,
        /// New password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    superuser: bool,
    active: bool,
    last_login: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            superuser: user.is_superuser,
            active: user.is_active,
            last_login: user
                .last_login
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;
    let cache = CacheManager::new(&config.redis).await?;
    let users = super::user_service(&pool, cache);

    match &args.command {
        UserCommand::List => {
            let rows: Vec<UserRow> = users.list_all().await?.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
        }
        UserCommand::Create {
            username,
            email,
            superuser,
            password,
        } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password()?,
            };
            let user = users
                .create_unchecked(CreateUserRequest {
                    username: username.clone(),
                    email: email.clone(),
                    password,
                    is_superuser: *superuser,
                    is_active: true,
                })
                .await?;
            output::print_item(&UserRow::from(&user), format);
        }
        UserCommand::SetPassword { username, password } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password()?,
            };
            users.set_password(username, &password).await?;
            output::print_success(&format!("Password updated for '{username}'"));
        }
    }

    Ok(())
}

fn prompt_password() -> Result<String, AppError> {
    dialoguer::Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
