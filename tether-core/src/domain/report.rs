//! Reported result types
//!
//! A [`ReportedResult`] is the only channel through which the agent tells the
//! mediator whether a job succeeded: a non-empty `error_message` means failure,
//! its absence means success.

use serde::{Deserialize, Deserializer, Serialize};

/// Error text used when a failure arrives without any description
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Inference failed without an error message";

/// Token usage and timing of a successful generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub response_time_ms: u64,
}

/// Metadata attached to a reported result
///
/// Serializes as an empty object for failed jobs. Reading accepts both `{}` and
/// `[]` as empty, the latter being what PHP emits for an empty array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseMetadata {
    Usage(UsageMetadata),
    Empty {},
}

/// Shapes of `response_metadata` found on the wire
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMetadata {
    Usage(UsageMetadata),
    Object(serde_json::Map<String, serde_json::Value>),
    List(Vec<serde_json::Value>),
}

impl<'de> Deserialize<'de> for ResponseMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawMetadata::deserialize(deserializer)? {
            RawMetadata::Usage(usage) => ResponseMetadata::Usage(usage),
            RawMetadata::Object(_) | RawMetadata::List(_) => ResponseMetadata::Empty {},
        })
    }
}

/// Payload sent to the mediator once a leased job has been handled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedResult {
    pub job_uuid: String,
    pub response_text: String,
    pub response_metadata: ResponseMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ReportedResult {
    /// Builds the result of a successful job
    pub fn success(
        job_uuid: impl Into<String>,
        response_text: impl Into<String>,
        usage: UsageMetadata,
    ) -> Self {
        Self {
            job_uuid: job_uuid.into(),
            response_text: response_text.into(),
            response_metadata: ResponseMetadata::Usage(usage),
            error_message: None,
        }
    }

    /// Builds the result of a failed job
    ///
    /// An empty error message is replaced with [`UNKNOWN_FAILURE_MESSAGE`] so the
    /// mediator can never mistake the report for a success.
    pub fn failure(job_uuid: impl Into<String>, error_message: impl Into<String>) -> Self {
        let error_message = error_message.into();
        let error_message = if error_message.trim().is_empty() {
            UNKNOWN_FAILURE_MESSAGE.to_string()
        } else {
            error_message
        };

        Self {
            job_uuid: job_uuid.into(),
            response_text: String::new(),
            response_metadata: ResponseMetadata::Empty {},
            error_message: Some(error_message),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error_message
            .as_deref()
            .is_some_and(|message| !message.is_empty())
    }
}
