//! Agent-side endpoints: leasing jobs and reporting their results

use reqwest::StatusCode;
use tether_core::domain::job::Job;
use tether_core::domain::report::ReportedResult;
use tether_core::dto::job::PollResponse;
use tracing::debug;

use crate::MediatorClient;
use crate::error::Result;

impl MediatorClient {
    /// Ask the mediator for the next pending job
    ///
    /// A returned job is leased to the caller until the mediator's lease expires.
    ///
    /// # Returns
    /// `Some(job)` when one was leased, `None` when the queue is empty
    pub async fn poll_job(&self) -> Result<Option<Job>> {
        let url = self.queue_url("/poll");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        // Some mediators answer an empty queue with 204 instead of has_job=false
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let poll: PollResponse = self.handle_response(response).await?;
        Ok(poll.into_job()?)
    }

    /// Report the result of a leased job
    ///
    /// The response body is ignored; any 2xx status counts as accepted.
    pub async fn submit_result(&self, result: &ReportedResult) -> Result<()> {
        let url = self.queue_url("/response");
        debug!("POST {} (job {})", url, result.job_uuid);

        let response = self.client.post(&url).json(result).send().await?;

        self.handle_empty_response(response).await
    }
}
