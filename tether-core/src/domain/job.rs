//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard upper bound on the generation limit sent to the inference backend
pub const MAX_GENERATION_TOKENS: u32 = 8192;

/// Model used when the mediator does not name one
pub const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Sampling temperature used when the mediator does not set one
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Token limit used when the mediator does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// A unit of inference work leased from the mediator
///
/// Built from a [`JobPayload`](crate::dto::job::JobPayload) once it has been
/// validated, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub created_at: DateTime<Utc>,
}

/// Caps a requested token count at [`MAX_GENERATION_TOKENS`]
pub fn clamp_generation_tokens(requested: u32) -> u32 {
    requested.min(MAX_GENERATION_TOKENS)
}

/// Job lifecycle state as reported by the mediator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
    NotFound,
}

impl JobState {
    /// Whether the job will never change state again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::NotFound)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Processing => write!(f, "processing"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
            JobState::NotFound => write!(f, "not_found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_tokens_pass_through_small_values() {
        assert_eq!(clamp_generation_tokens(1), 1);
        assert_eq!(clamp_generation_tokens(2000), 2000);
        assert_eq!(clamp_generation_tokens(8192), 8192);
    }

    #[test]
    fn test_generation_tokens_are_capped() {
        assert_eq!(clamp_generation_tokens(8193), 8192);
        assert_eq!(clamp_generation_tokens(u32::MAX), 8192);
    }

    #[test]
    fn test_job_state_wire_names() {
        let state: JobState = serde_json::from_str("\"not_found\"").unwrap();
        assert_eq!(state, JobState::NotFound);
        assert_eq!(
            serde_json::to_string(&JobState::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::NotFound.is_terminal());
    }
}
