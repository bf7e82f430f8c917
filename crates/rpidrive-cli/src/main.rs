//! RPi Drive CLI entry point.

use clap::Parser;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        output::print_error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
