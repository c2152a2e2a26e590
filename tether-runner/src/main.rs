//! Tether Runner
//!
//! A stateless agent that bridges a remote job queue and a local Ollama instance.
//!
//! Architecture:
//! - Configuration: Flags and environment variables, validated at startup
//! - Repositories: HTTP communication with the mediator (poll, report)
//! - Services: Inference against the local backend and result reporting
//! - Scheduler: The poll cycle state machine and its retry policy
//!
//! The agent leases one job at a time, runs it, reports the outcome and polls
//! again. It keeps no state between cycles.

mod config;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, Config};
use crate::repository::{HttpJobRepository, JobRepository};
use crate::scheduler::JobPoller;
use crate::service::{InferenceService, OllamaInferenceService};
use tether_client::MediatorClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether_runner=info,tether_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tether Runner");

    let config = Config::from(Cli::parse());
    config.validate().context("Invalid configuration")?;
    info!(
        "Loaded configuration: agent_id={}, api_url={}, ollama_url={}",
        config.agent_id, config.api_url, config.ollama_url
    );

    let client = MediatorClient::with_timeouts(
        config.api_url.clone(),
        config.request_timeout,
        config.connect_timeout,
    )
    .context("Failed to build mediator client")?;
    let jobs: Arc<dyn JobRepository> = Arc::new(HttpJobRepository::new(client));

    info!("Mediator client initialized");

    let ollama = OllamaInferenceService::from_config(&config)
        .context("Failed to build inference client")?;
    check_backend(&ollama).await;
    let inference: Arc<dyn InferenceService> = Arc::new(ollama);

    info!("Services initialized");

    let poller = JobPoller::new(config, jobs, inference);

    info!("Starting job polling loop");
    poller.run().await;

    Ok(())
}

/// Logs the models the backend offers
///
/// An unreachable backend is not fatal: jobs fail individually and are
/// reported until it comes back.
async fn check_backend(ollama: &OllamaInferenceService) {
    match ollama.list_models().await {
        Ok(models) if models.is_empty() => {
            warn!("Inference backend is reachable but has no models installed");
        }
        Ok(models) => {
            info!("Inference backend offers {} model(s)", models.len());
            for model in &models {
                info!("  - {}", model);
            }
        }
        Err(e) => {
            warn!("Inference backend is not reachable yet: {:#}", e);
        }
    }
}
