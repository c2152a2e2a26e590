//! Request command handlers
//!
//! Enqueueing prompts, reading job status and waiting for answers.

use anyhow::{Result, bail};
use clap::Args;
use colored::*;
use std::time::Duration;
use tether_client::MediatorClient;
use tether_core::domain::job::JobState;
use tether_core::domain::report::ResponseMetadata;
use tether_core::dto::job::{EnqueueRequest, JobStatusReport};
use tokio::time::Instant;

/// Largest generation limit a submitter may ask for
pub const MAX_REQUESTED_TOKENS: u32 = 8000;

/// Prompt and generation parameters shared by `submit` and `ask`
#[derive(Debug, Args)]
pub struct PromptArgs {
    /// User prompt
    pub prompt: String,

    /// Optional system prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Model to run the prompt on
    #[arg(long, default_value = "qwen2.5:7b")]
    pub model: String,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f64,

    /// Generation limit (1 to 8000)
    #[arg(long, default_value_t = 2000)]
    pub max_tokens: u32,
}

impl PromptArgs {
    /// Validates the arguments and builds the enqueue request
    pub fn into_request(self) -> Result<EnqueueRequest> {
        if self.prompt.trim().is_empty() {
            bail!("Prompt cannot be empty");
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("Temperature must be between 0.0 and 2.0");
        }

        if self.max_tokens == 0 || self.max_tokens > MAX_REQUESTED_TOKENS {
            bail!("max_tokens must be between 1 and {}", MAX_REQUESTED_TOKENS);
        }

        Ok(EnqueueRequest {
            prompt: self.prompt,
            system_prompt: self.system.filter(|s| !s.trim().is_empty()),
            model: Some(self.model),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        })
    }
}

/// Enqueue a prompt
pub async fn submit(client: &MediatorClient, args: PromptArgs) -> Result<()> {
    let request = args.into_request()?;
    let enqueued = client.enqueue_request(&request).await?;

    println!("{} Job enqueued", "✓".green());
    println!("  ID:     {}", enqueued.job_uuid.cyan());
    println!("  Status: {}", colorize_state(enqueued.status));

    Ok(())
}

/// Show a job's state
pub async fn status(client: &MediatorClient, id: &str, json: bool) -> Result<()> {
    let report = client.job_status(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_status(&report);
    }

    Ok(())
}

/// Enqueue a prompt and poll its status until it settles or `max_wait` elapses
///
/// Connection failures and 5xx answers while polling are reported and retried
/// until the deadline; any other error ends the wait.
pub async fn ask(
    client: &MediatorClient,
    args: PromptArgs,
    interval: u64,
    max_wait: u64,
) -> Result<()> {
    if interval == 0 {
        bail!("interval must be greater than 0");
    }

    let request = args.into_request()?;
    let enqueued = client.enqueue_request(&request).await?;
    println!(
        "{}",
        format!("Job {} enqueued, waiting for an agent...", enqueued.job_uuid).dimmed()
    );

    let deadline = Instant::now() + Duration::from_secs(max_wait);
    let mut last_status = enqueued.status;
    loop {
        tokio::time::sleep(Duration::from_secs(interval)).await;

        match client.job_status(&enqueued.job_uuid).await {
            Ok(report) if report.status.is_terminal() => {
                print_status(&report);
                if report.status != JobState::Completed {
                    bail!("Job {} ended as {}", report.job_uuid, report.status);
                }
                return Ok(());
            }
            Ok(report) => last_status = report.status,
            Err(e) if e.is_transport() || e.is_server_error() => {
                eprintln!("{} {}", "⚠ Status check failed, retrying:".yellow(), e);
            }
            Err(e) => return Err(e.into()),
        }

        if Instant::now() >= deadline {
            bail!(
                "Job {} still {} after {}s",
                enqueued.job_uuid,
                last_status,
                max_wait
            );
        }
    }
}

/// Print a job's state and, once settled, its answer
fn print_status(report: &JobStatusReport) {
    println!("{}", "Job Details:".bold());
    println!("  ID:     {}", report.job_uuid.cyan());
    println!("  Status: {}", colorize_state(report.status));

    if let Some(model) = &report.model {
        println!("  Model:  {}", model);
    }

    if let Some(ResponseMetadata::Usage(usage)) = &report.response_metadata {
        println!(
            "  Tokens: {} in / {} out ({} ms)",
            usage.input_tokens, usage.output_tokens, usage.response_time_ms
        );
    }

    if let Some(text) = report.response_text.as_deref().filter(|t| !t.is_empty()) {
        println!("\n{}", "Response:".bold());
        println!("{}", text);
    }

    if let Some(error) = &report.error_message {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

/// Colorize job state for display
fn colorize_state(state: JobState) -> ColoredString {
    let text = state.to_string();
    match state {
        JobState::Queued => text.yellow(),
        JobState::Processing => text.cyan(),
        JobState::Completed => text.green(),
        JobState::Failed => text.red(),
        JobState::NotFound => text.dimmed(),
    }
}
