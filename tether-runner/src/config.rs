//! Runner configuration
//!
//! Every option can be given as a command-line flag or an environment variable;
//! the flag wins when both are present. Parsed arguments are turned into a
//! [`Config`] holding durations, which is validated before the agent starts.

use clap::Parser;
use std::time::Duration;
use tether_client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

use crate::scheduler::RetryPolicy;

/// Mediator used when none is configured
pub const DEFAULT_API_URL: &str = "https://waldus.cloud/api/v1";

/// Inference backend used when none is configured
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Command-line arguments of the agent
#[derive(Debug, Parser)]
#[command(name = "tether-runner")]
#[command(about = "Polls a remote job queue and runs each job against a local Ollama", long_about = None)]
pub struct Cli {
    /// Mediator base URL
    #[arg(long, env = "OLLAMA_POLLING_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Seconds to wait after an empty or failed poll
    #[arg(long, env = "OLLAMA_POLLING_INTERVAL", default_value_t = 3)]
    pub poll_interval: u64,

    /// Local inference backend base URL
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Milliseconds to pause after every cycle
    #[arg(long, env = "TETHER_IDLE_DELAY_MS", default_value_t = 1000)]
    pub idle_delay_ms: u64,

    /// Seconds allowed for a single inference call
    #[arg(long, env = "TETHER_INFERENCE_TIMEOUT", default_value_t = 300)]
    pub inference_timeout: u64,

    /// Seconds allowed for a poll or report call
    #[arg(long, env = "TETHER_REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout: u64,

    /// Seconds allowed to connect to the mediator
    #[arg(long, env = "TETHER_CONNECT_TIMEOUT", default_value_t = 5)]
    pub connect_timeout: u64,

    /// How the wait after a failed poll evolves
    #[arg(long, env = "TETHER_RETRY_POLICY", value_enum, default_value_t = RetryPolicy::Flat)]
    pub retry_policy: RetryPolicy,

    /// Upper bound in seconds on the exponential retry delay
    #[arg(long, env = "TETHER_MAX_RETRY_DELAY", default_value_t = 60)]
    pub max_retry_delay: u64,

    /// Identifier of this agent in logs (random when unset)
    #[arg(long, env = "TETHER_AGENT_ID")]
    pub agent_id: Option<String>,
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of this agent instance
    pub agent_id: String,

    /// Mediator base URL (e.g., "https://waldus.cloud/api/v1")
    pub api_url: String,

    /// Inference backend base URL (e.g., "http://localhost:11434")
    pub ollama_url: String,

    /// Wait after an empty poll, and after a failed one under the flat policy
    pub poll_interval: Duration,

    /// Pause after every cycle regardless of outcome
    pub idle_delay: Duration,

    /// Hard limit on a single inference call
    pub inference_timeout: Duration,

    /// Time allowed to connect to the inference backend
    pub inference_connect_timeout: Duration,

    /// Limit on poll and report calls
    pub request_timeout: Duration,

    /// Time allowed to connect to the mediator
    pub connect_timeout: Duration,

    /// Retry behaviour after failed polls
    pub retry_policy: RetryPolicy,

    /// Cap on the exponential retry delay
    pub max_retry_delay: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_url: String, ollama_url: String) -> Self {
        Self {
            agent_id: uuid::Uuid::new_v4().to_string(),
            api_url,
            ollama_url,
            poll_interval: Duration::from_secs(3),
            idle_delay: Duration::from_secs(1),
            inference_timeout: Duration::from_secs(300), // 5 minutes
            inference_connect_timeout: Duration::from_secs(10),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_policy: RetryPolicy::Flat,
            max_retry_delay: Duration::from_secs(60),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_id.trim().is_empty() {
            anyhow::bail!("agent_id cannot be empty");
        }

        validate_url("api_url", &self.api_url)?;
        validate_url("ollama_url", &self.ollama_url)?;

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.idle_delay.is_zero() {
            anyhow::bail!("idle_delay must be greater than 0");
        }

        if self.inference_timeout.is_zero() {
            anyhow::bail!("inference_timeout must be greater than 0");
        }

        if self.request_timeout.is_zero() || self.connect_timeout.is_zero() {
            anyhow::bail!("request and connect timeouts must be greater than 0");
        }

        if self.retry_policy == RetryPolicy::Exponential
            && self.max_retry_delay < self.poll_interval
        {
            anyhow::bail!("max_retry_delay must not be shorter than poll_interval");
        }

        Ok(())
    }
}

fn validate_url(name: &str, url: &str) -> anyhow::Result<()> {
    if url.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }

    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL.to_string(), DEFAULT_OLLAMA_URL.to_string())
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let mut config = Config::new(cli.api_url, cli.ollama_url);

        if let Some(agent_id) = cli.agent_id {
            config.agent_id = agent_id;
        }
        config.poll_interval = Duration::from_secs(cli.poll_interval);
        config.idle_delay = Duration::from_millis(cli.idle_delay_ms);
        config.inference_timeout = Duration::from_secs(cli.inference_timeout);
        config.request_timeout = Duration::from_secs(cli.request_timeout);
        config.connect_timeout = Duration::from_secs(cli.connect_timeout);
        config.retry_policy = cli.retry_policy;
        config.max_retry_delay = Duration::from_secs(cli.max_retry_delay);

        config
    }
}
