//! Tether HTTP Client
//!
//! A small, type-safe HTTP client for the mediator queue that sits between cloud
//! submitters and the local polling agent.
//!
//! The agent uses it to poll for work and report results; submitters use it to
//! enqueue prompts and check on them.
//!
//! # Example
//!
//! ```no_run
//! use tether_client::MediatorClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = MediatorClient::new("https://waldus.cloud/api/v1");
//!
//!     match client.poll_job().await? {
//!         Some(job) => println!("Leased job {}", job.id),
//!         None => println!("Queue is empty"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod requests;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Total time allowed for a poll or report call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed to establish a connection to the mediator
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Path prefix under which the mediator exposes its queue
const QUEUE_PREFIX: &str = "/ollama";

/// HTTP client for the mediator API
///
/// Endpoints are grouped as:
/// - Agent side: poll for a job, report its result
/// - Submitter side: enqueue a request, read its status
#[derive(Debug, Clone)]
pub struct MediatorClient {
    /// Base URL of the mediator (e.g., "https://waldus.cloud/api/v1")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl MediatorClient {
    /// Create a new mediator client with reqwest defaults
    ///
    /// # Example
    /// ```
    /// use tether_client::MediatorClient;
    ///
    /// let client = MediatorClient::new("https://waldus.cloud/api/v1");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client whose calls are bounded by the given timeouts
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the mediator API
    /// * `request_timeout` - Upper bound on a whole request
    /// * `connect_timeout` - Upper bound on establishing the connection
    pub fn with_timeouts(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self::with_client(base_url, client))
    }

    /// Create a new mediator client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the mediator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a queue endpoint
    fn queue_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, QUEUE_PREFIX, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become [`ClientError::ApiError`] carrying the body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = MediatorClient::new("https://waldus.cloud/api/v1");
        assert_eq!(client.base_url(), "https://waldus.cloud/api/v1");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = MediatorClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_timeouts() {
        let client = MediatorClient::with_timeouts(
            "http://localhost:8080",
            DEFAULT_REQUEST_TIMEOUT,
            DEFAULT_CONNECT_TIMEOUT,
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_queue_url() {
        let client = MediatorClient::new("http://localhost:8080/api/v1/");
        assert_eq!(
            client.queue_url("/poll"),
            "http://localhost:8080/api/v1/ollama/poll"
        );
    }
}
