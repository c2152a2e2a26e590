//! Result reporting
//!
//! Turns an inference outcome into the payload the mediator expects and
//! delivers it. Delivery is attempted once; a lost report leaves the job leased
//! until the mediator reclaims it.

use tether_core::domain::inference::InferenceOutcome;
use tether_core::domain::report::{ReportedResult, UsageMetadata};
use tracing::{error, info};

use crate::repository::JobRepository;

/// Builds the reported result for a job from its inference outcome
pub fn build_report(job_id: &str, outcome: InferenceOutcome) -> ReportedResult {
    match outcome {
        InferenceOutcome::Success(generation) => ReportedResult::success(
            job_id,
            generation.text,
            UsageMetadata {
                input_tokens: generation.input_tokens,
                output_tokens: generation.output_tokens,
                response_time_ms: generation.elapsed_ms,
            },
        ),
        InferenceOutcome::Failure { error_message } => {
            ReportedResult::failure(job_id, error_message)
        }
    }
}

/// Sends a result to the mediator exactly once
///
/// # Returns
/// `true` if the mediator accepted it
pub async fn deliver_report(jobs: &dyn JobRepository, report: &ReportedResult) -> bool {
    match jobs.submit_result(report).await {
        Ok(()) => {
            if report.is_failure() {
                info!("Failure for job {} reported to mediator", report.job_uuid);
            } else {
                info!("Response for job {} delivered", report.job_uuid);
            }
            true
        }
        Err(e) => {
            error!(
                "Failed to deliver result for job {}: {} (job stays leased until the mediator reclaims it)",
                report.job_uuid, e
            );
            false
        }
    }
}
