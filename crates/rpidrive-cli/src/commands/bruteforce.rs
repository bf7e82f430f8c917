//! Reset the login brute-force counters.

use clap::Args;

use rpidrive_auth::BruteForceGuard;
use rpidrive_cache::CacheManager;
use rpidrive_core::config::AppConfig;
use rpidrive_core::error::AppError;

use crate::output;

/// Arguments for the reset-bruteforce command
#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Skip confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Execute the reset-bruteforce command
pub async fn execute(args: &ResetArgs, config: &AppConfig) -> Result<(), AppError> {
    if !config.redis.enabled {
        output::print_warning(
            "Redis is disabled: counters live inside the server process and clear on restart.",
        );
        return Ok(());
    }

    if !args.force {
        let confirm = dialoguer::Confirm::new()
            .with_prompt("Unblock every client address?")
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let cache = CacheManager::new(&config.redis).await?;
    let guard = BruteForceGuard::new(cache, &config.security);
    let removed = guard.reset_all().await?;
    output::print_success(&format!("Removed {removed} brute-force counter(s)."));
    Ok(())
}
