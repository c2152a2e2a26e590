//! Service layer
//!
//! Services contain the runner's business logic: running a job against the
//! local inference backend and turning the outcome into a reported result.
//!
//! The inference service is trait-based to enable testing and dependency injection.

mod inference;
mod reporting;

// Re-export traits
pub use inference::InferenceService;

// Re-export implementations
pub use inference::{GenerationRequest, OllamaInferenceService};
pub use reporting::{build_report, deliver_report};
