//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod request;

pub use request::PromptArgs;

use anyhow::Result;
use clap::Subcommand;
use tether_client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, MediatorClient};

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Enqueue a prompt and print its job id
    Submit {
        #[command(flatten)]
        prompt: PromptArgs,
    },
    /// Show the current state of a job
    Status {
        /// Job id returned by `submit`
        id: String,

        /// Print the raw status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enqueue a prompt and wait for the answer
    Ask {
        #[command(flatten)]
        prompt: PromptArgs,

        /// Seconds between status checks
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// Seconds to wait before giving up
        #[arg(long, default_value_t = 120)]
        max_wait: u64,
    },
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = MediatorClient::with_timeouts(
        config.api_url.clone(),
        DEFAULT_REQUEST_TIMEOUT,
        DEFAULT_CONNECT_TIMEOUT,
    )?;

    match command {
        Commands::Submit { prompt } => request::submit(&client, prompt).await,
        Commands::Status { id, json } => request::status(&client, &id, json).await,
        Commands::Ask {
            prompt,
            interval,
            max_wait,
        } => request::ask(&client, prompt, interval, max_wait).await,
    }
}
