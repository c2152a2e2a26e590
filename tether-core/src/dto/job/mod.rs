//! Job DTOs for mediator communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::job::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, Job, JobState,
};
use crate::domain::report::ResponseMetadata;

/// Errors raised while turning a poll payload into a [`Job`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobPayloadError {
    /// `has_job` was true but no job was attached
    #[error("poll response announced a job but carried none")]
    MissingJob,

    /// The job identifier was empty
    #[error("job payload has an empty job_uuid")]
    EmptyJobId,
}

/// Response of the mediator's poll endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub has_job: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobPayload>,
}

impl PollResponse {
    /// A response carrying one job
    pub fn with_job(job: JobPayload) -> Self {
        Self {
            has_job: true,
            job: Some(job),
        }
    }

    /// Validates the response and extracts the leased job, if any
    pub fn into_job(self) -> Result<Option<Job>, JobPayloadError> {
        match (self.has_job, self.job) {
            (false, _) => Ok(None),
            (true, None) => Err(JobPayloadError::MissingJob),
            (true, Some(payload)) => Job::try_from(payload).map(Some),
        }
    }
}

/// A leased job as sent by the mediator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    #[serde(alias = "id")]
    pub job_uuid: String,
    pub request_data: RequestData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Generation parameters of a leased job
///
/// Every field is optional on the wire; defaults are applied when converting
/// into a [`Job`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl TryFrom<JobPayload> for Job {
    type Error = JobPayloadError;

    fn try_from(payload: JobPayload) -> Result<Self, Self::Error> {
        if payload.job_uuid.trim().is_empty() {
            return Err(JobPayloadError::EmptyJobId);
        }

        let data = payload.request_data;

        Ok(Job {
            id: payload.job_uuid,
            prompt: data.user.unwrap_or_default(),
            system_prompt: data.system.filter(|system| !system.is_empty()),
            model: data
                .model
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: data.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: data.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            created_at: payload.created_at.unwrap_or_else(Utc::now),
        })
    }
}

// =============================================================================
// Submitter-side DTOs
// =============================================================================

/// Request to enqueue a new generation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Acknowledgement returned when a job has been enqueued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueuedJob {
    #[serde(alias = "id")]
    pub job_uuid: String,
    pub status: JobState,
}

/// Current state of a job as seen by the mediator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    #[serde(alias = "id")]
    pub job_uuid: String,
    pub status: JobState,
    #[serde(default, alias = "response", skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_metadata: Option<ResponseMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl JobStatusReport {
    /// Status for a job the mediator does not know about
    pub fn not_found(job_uuid: impl Into<String>) -> Self {
        Self {
            job_uuid: job_uuid.into(),
            status: JobState::NotFound,
            response_text: None,
            error_message: None,
            response_metadata: None,
            model: None,
        }
    }
}
