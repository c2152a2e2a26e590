//! Error types for the mediator client

use tether_core::dto::job::JobPayloadError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the mediator
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or other transport failure
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Mediator answered with a non-success status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body was not the expected JSON
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Response was well-formed JSON but violated the poll contract
    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] JobPayloadError),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Connection refused, DNS failure, timeout and the like
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed(_))
    }

    /// Non-success status or a body that does not match the contract
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::ApiError { .. } | Self::ParseError(_) | Self::InvalidResponse(_)
        )
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
