//! Configuration inspection commands.

use clap::{Args, Subcommand};

use rpidrive_core::config::AppConfig;
use rpidrive_core::error::AppError;

use crate::output::{self, OutputFormat};

const MASK: &str = "********";

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets masked
    Show,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = masked(config);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                OutputFormat::Table => print_sections(&config),
            }
        }
    }
    Ok(())
}

/// Copy of the configuration safe to print.
fn masked(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    if !config.web.secret_key.is_empty() {
        config.web.secret_key = MASK.to_string();
    }
    if !config.database.password.is_empty() {
        config.database.password = MASK.to_string();
    }
    config
}

fn print_sections(config: &AppConfig) {
    let web = &config.web;
    output::print_section("web");
    output::print_kv("secret-key", &web.secret_key);
    output::print_kv("listen", &format!("{}:{}", web.host, web.port));
    output::print_kv("time-zone", &web.time_zone);
    output::print_kv("temp-dir", &web.temp_dir.display().to_string());
    output::print_kv("log-level", &web.log_level);
    output::print_kv(
        "log-dir",
        &web.log_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    output::print_kv("public-link-expiry", &web.public_link_expiry.to_string());
    output::print_kv("session-expiry", &web.session_expiry.to_string());
    output::print_kv("debug", &web.debug.to_string());

    output::print_section("indexer");
    output::print_kv("period", &config.indexer.period.to_string());

    let db = &config.database;
    output::print_section("database");
    output::print_kv("server", &format!("{}:{}", db.host, db.port));
    output::print_kv("name", &db.name);
    output::print_kv("user", &db.user);
    output::print_kv("password", &db.password);

    let redis = &config.redis;
    output::print_section("redis");
    output::print_kv("enabled", &redis.enabled.to_string());
    output::print_kv("server", &format!("{}:{}/{}", redis.host, redis.port, redis.db));

    let security = &config.security;
    output::print_section("security");
    output::print_kv("block-spam", &security.block_spam.to_string());
    output::print_kv("block-trigger", &security.block_trigger.to_string());
    output::print_kv("block-duration", &security.block_duration.to_string());
    output::print_kv("domain", security.domain.as_deref().unwrap_or("-"));

    output::print_section("reverse-proxy");
    output::print_kv(
        "ip-header",
        config.reverse_proxy.ip_header.as_deref().unwrap_or("-"),
    );

    output::print_section("worker");
    output::print_kv("tick-seconds", &config.worker.tick_seconds.to_string());
    output::print_kv("init-file", &config.init_file().display().to_string());
}
