//! Jobs repository
//!
//! Handles communication with the mediator for the two agent-side operations:
//! - Leasing the next pending job
//! - Reporting the result of a leased job

use async_trait::async_trait;
use tether_client::{MediatorClient, Result};
use tether_core::domain::job::Job;
use tether_core::domain::report::ReportedResult;

/// Repository trait for job-related operations with the mediator
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Leases the next pending job, if any
    ///
    /// Errors keep the mediator client's classification so callers can tell a
    /// transport failure from a protocol violation.
    async fn poll_job(&self) -> Result<Option<Job>>;

    /// Reports the result of a previously leased job
    ///
    /// # Arguments
    /// * `result` - The result; its `job_uuid` must come from [`poll_job`](Self::poll_job)
    async fn submit_result(&self, result: &ReportedResult) -> Result<()>;
}

/// HTTP implementation of JobRepository
pub struct HttpJobRepository {
    client: MediatorClient,
}

impl HttpJobRepository {
    /// Creates a new HTTP job repository
    ///
    /// # Arguments
    /// * `client` - Mediator client, already configured with timeouts
    pub fn new(client: MediatorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobRepository for HttpJobRepository {
    async fn poll_job(&self) -> Result<Option<Job>> {
        self.client.poll_job().await
    }

    async fn submit_result(&self, result: &ReportedResult) -> Result<()> {
        self.client.submit_result(result).await
    }
}
