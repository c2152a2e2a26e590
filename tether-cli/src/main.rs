//! Tether CLI
//!
//! Command-line interface for submitting prompts to the mediator queue and
//! following them until an agent has answered.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Submit prompts to a remote Ollama job queue", long_about = None)]
struct Cli {
    /// Mediator base URL
    #[arg(
        long,
        env = "OLLAMA_POLLING_API_URL",
        default_value = "https://waldus.cloud/api/v1"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
    };

    handle_command(cli.command, &config).await
}
