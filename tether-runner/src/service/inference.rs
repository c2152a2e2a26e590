//! Inference service
//!
//! Runs a single generation against an Ollama-compatible backend using its
//! non-streaming `/api/generate` endpoint. Every failure mode is folded into an
//! [`InferenceOutcome`] so the caller can always report something for the job.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tether_core::domain::inference::{Generation, InferenceOutcome};
use tether_core::domain::job::{Job, clamp_generation_tokens};
use tracing::{debug, info};

use crate::config::Config;

/// Failure text for a 2xx answer without generated text
pub const MISSING_RESPONSE_MESSAGE: &str =
    "Invalid response structure from Ollama: missing 'response' field";

/// Parameters of one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl From<&Job> for GenerationRequest {
    fn from(job: &Job) -> Self {
        Self {
            model: job.model.clone(),
            prompt: job.prompt.clone(),
            system_prompt: job.system_prompt.clone(),
            temperature: job.temperature,
            max_tokens: job.max_tokens,
        }
    }
}

/// Service trait for running generations
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Runs one generation to completion
    ///
    /// Never fails: transport errors, error statuses and malformed bodies all
    /// come back as [`InferenceOutcome::Failure`].
    async fn generate(&self, request: &GenerationRequest) -> InferenceOutcome;
}

// -- Ollama API request/response types --

/// Request body for Ollama's `/api/generate` endpoint
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Always false: the whole text is awaited in one response
    stream: bool,
    options: OllamaOptions,
}

/// Generation options for Ollama
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

/// Response from Ollama's `/api/generate` endpoint (non-streaming)
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Response from Ollama's `/api/tags` endpoint
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

/// Inference service backed by a local Ollama instance
pub struct OllamaInferenceService {
    client: Client,
    base_url: String,
}

impl OllamaInferenceService {
    /// Creates a service whose calls are bounded by the given timeouts
    ///
    /// # Arguments
    /// * `base_url` - Ollama base URL (e.g., "http://localhost:11434")
    /// * `timeout` - Upper bound on a whole generation call
    /// * `connect_timeout` - Upper bound on establishing the connection
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build inference HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates the service from runner configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.ollama_url.clone(),
            config.inference_timeout,
            config.inference_connect_timeout,
        )
    }

    /// Lists the names of the models installed on the backend
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach inference backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to list models: {} - {}", status, body);
        }

        let tags = response
            .json::<OllamaTagsResponse>()
            .await
            .context("Failed to parse model list")?;

        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }

    /// Converts a generation request into Ollama's wire format
    ///
    /// The system prompt goes in its dedicated field; the token limit is capped.
    fn build_request(request: &GenerationRequest) -> OllamaGenerateRequest {
        OllamaGenerateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request
                .system_prompt
                .clone()
                .filter(|system| !system.is_empty()),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: clamp_generation_tokens(request.max_tokens),
            },
        }
    }

    /// Interprets the body of a 2xx response
    fn parse_response(body: &str, elapsed_ms: u64) -> InferenceOutcome {
        let parsed: OllamaGenerateResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return InferenceOutcome::failure(format!(
                    "Invalid response structure from Ollama: {}",
                    e
                ));
            }
        };

        let Some(raw_text) = parsed.response else {
            return InferenceOutcome::failure(MISSING_RESPONSE_MESSAGE);
        };

        let text = raw_text.trim().to_string();

        InferenceOutcome::Success(Generation {
            response_length: text.chars().count(),
            text,
            input_tokens: parsed.prompt_eval_count.unwrap_or(0),
            output_tokens: parsed.eval_count.unwrap_or(0),
            elapsed_ms,
        })
    }
}

#[async_trait]
impl InferenceService for OllamaInferenceService {
    async fn generate(&self, request: &GenerationRequest) -> InferenceOutcome {
        let url = format!("{}/api/generate", self.base_url);
        let body = Self::build_request(request);

        debug!(
            "Generation request: model={}, prompt_length={}, system={}, num_predict={}",
            body.model,
            body.prompt.len(),
            body.system.is_some(),
            body.options.num_predict
        );

        let started = Instant::now();

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return InferenceOutcome::failure(e.to_string()),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return InferenceOutcome::failure(e.to_string()),
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !status.is_success() {
            return InferenceOutcome::failure(format!("HTTP {}: {}", status.as_u16(), text));
        }

        let outcome = Self::parse_response(&text, elapsed_ms);
        if let InferenceOutcome::Success(generation) = &outcome {
            info!(
                "Generation finished: {} chars, tokens in/out {}/{}, {} ms",
                generation.response_length,
                generation.input_tokens,
                generation.output_tokens,
                generation.elapsed_ms
            );
        }

        outcome
    }
}
