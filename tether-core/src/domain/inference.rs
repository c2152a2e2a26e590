//! Inference outcome types
//!
//! These types only exist while a job is being handled. They are not persisted
//! and never sent over the network as-is; see [`ReportedResult`](super::report::ReportedResult).

/// Text produced by a successful inference call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Generated text, trimmed of surrounding whitespace
    pub text: String,
    /// Length of `text` in characters
    pub response_length: usize,
    /// Prompt tokens as counted by the backend
    pub input_tokens: u64,
    /// Generated tokens as counted by the backend
    pub output_tokens: u64,
    /// Wall-clock duration of the call
    pub elapsed_ms: u64,
}

/// Result of a single inference call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceOutcome {
    Success(Generation),
    Failure { error_message: String },
}

impl InferenceOutcome {
    /// Creates a failed outcome
    pub fn failure(error_message: impl Into<String>) -> Self {
        InferenceOutcome::Failure {
            error_message: error_message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InferenceOutcome::Success(_))
    }

    /// Error text if the call failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            InferenceOutcome::Success(_) => None,
            InferenceOutcome::Failure { error_message } => Some(error_message),
        }
    }
}
