//! Submitter-side endpoints: enqueueing prompts and checking on them

use reqwest::StatusCode;
use tether_core::dto::job::{EnqueueRequest, EnqueuedJob, JobStatusReport};

use crate::MediatorClient;
use crate::error::Result;

impl MediatorClient {
    /// Enqueue a new generation job
    ///
    /// # Returns
    /// The identifier the mediator assigned, with the initial state
    pub async fn enqueue_request(&self, req: &EnqueueRequest) -> Result<EnqueuedJob> {
        let url = self.queue_url("/request");
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get the current state of a job
    ///
    /// An unknown job is reported as [`JobState::NotFound`](tether_core::domain::job::JobState::NotFound)
    /// rather than as an error.
    pub async fn job_status(&self, job_uuid: &str) -> Result<JobStatusReport> {
        let url = self.queue_url(&format!("/status/{}", job_uuid));
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(JobStatusReport::not_found(job_uuid));
        }

        self.handle_response(response).await
    }
}
