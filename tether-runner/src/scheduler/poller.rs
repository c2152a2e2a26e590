//! Job poller
//!
//! Drives the poll cycle as an explicit state machine:
//! `Polling → (Empty | Dispatching → Reporting) → Idle`.
//! One job at a time: no poll is issued while a job is dispatched or reported.

use std::sync::Arc;
use tether_core::domain::inference::InferenceOutcome;
use tether_core::domain::job::Job;
use tether_core::domain::report::ReportedResult;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::Config;
use crate::repository::JobRepository;
use crate::scheduler::{RetryBackoff, Sleeper, TokioSleeper};
use crate::service::{GenerationRequest, InferenceService, build_report, deliver_report};

/// Where a poll cycle currently is
#[derive(Debug)]
enum CycleState {
    /// Asking the mediator for work
    Polling,
    /// The queue was empty
    Empty,
    /// Running a leased job against the inference backend
    Dispatching(Job),
    /// Sending the job's result to the mediator
    Reporting(ReportedResult),
    /// Cycle finished; pause before the next one
    Idle(CycleOutcome),
}

/// How a poll cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The poll itself failed (transport or protocol)
    PollFailed,
    /// The queue was empty
    NoJob,
    /// A job was leased, run and reported
    Completed {
        job_id: String,
        success: bool,
        delivered: bool,
    },
}

/// Polls the mediator for jobs and runs them one at a time
pub struct JobPoller {
    config: Config,
    jobs: Arc<dyn JobRepository>,
    inference: Arc<dyn InferenceService>,
    sleeper: Arc<dyn Sleeper>,
    backoff: RetryBackoff,
    iteration: u64,
}

impl JobPoller {
    /// Creates a new job poller sleeping on the tokio timer
    pub fn new(
        config: Config,
        jobs: Arc<dyn JobRepository>,
        inference: Arc<dyn InferenceService>,
    ) -> Self {
        let backoff = RetryBackoff::new(
            config.retry_policy,
            config.poll_interval,
            config.max_retry_delay,
        );

        Self {
            config,
            jobs,
            inference,
            sleeper: Arc::new(TokioSleeper),
            backoff,
            iteration: 0,
        }
    }

    /// Replaces the source of pauses between and within cycles
    #[allow(dead_code)]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Number of cycles started so far
    #[allow(dead_code)]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Runs poll cycles until the process is stopped
    pub async fn run(mut self) {
        let span = info_span!("agent", id = %self.config.agent_id);

        async move {
            info!(
                "Starting job poller (interval: {:?}, idle delay: {:?}, retry policy: {:?})",
                self.config.poll_interval, self.config.idle_delay, self.config.retry_policy
            );

            loop {
                self.run_cycle().await;
            }
        }
        .instrument(span)
        .await
    }

    /// Performs a single poll cycle, including the closing idle pause
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.iteration += 1;
        debug!("Iteration #{}: checking for jobs", self.iteration);

        let mut state = CycleState::Polling;
        loop {
            state = match state {
                CycleState::Idle(outcome) => {
                    self.sleeper.sleep(self.config.idle_delay).await;
                    return outcome;
                }
                active => self.advance(active).await,
            };
        }
    }

    /// Moves the cycle one state forward
    async fn advance(&mut self, state: CycleState) -> CycleState {
        match state {
            CycleState::Polling => self.poll().await,
            CycleState::Empty => {
                info!(
                    "No jobs in queue, waiting {:?}",
                    self.config.poll_interval
                );
                self.sleeper.sleep(self.config.poll_interval).await;
                CycleState::Idle(CycleOutcome::NoJob)
            }
            CycleState::Dispatching(job) => {
                let outcome = self.dispatch(&job).await;
                CycleState::Reporting(build_report(&job.id, outcome))
            }
            CycleState::Reporting(report) => {
                let delivered = deliver_report(self.jobs.as_ref(), &report).await;
                CycleState::Idle(CycleOutcome::Completed {
                    success: !report.is_failure(),
                    job_id: report.job_uuid,
                    delivered,
                })
            }
            idle @ CycleState::Idle(_) => idle,
        }
    }

    /// Asks the mediator for one job
    async fn poll(&mut self) -> CycleState {
        match self.jobs.poll_job().await {
            Ok(Some(job)) => {
                self.backoff.reset();
                info!("Found job {} (model: {})", job.id, job.model);
                CycleState::Dispatching(job)
            }
            Ok(None) => {
                self.backoff.reset();
                CycleState::Empty
            }
            Err(e) => {
                let kind = if e.is_transport() {
                    "connection error"
                } else {
                    "protocol error"
                };
                let delay = self.backoff.next_delay();
                warn!("Poll failed ({}): {}; retrying in {:?}", kind, e, delay);
                self.sleeper.sleep(delay).await;
                CycleState::Idle(CycleOutcome::PollFailed)
            }
        }
    }

    /// Runs a job under the inference timeout
    ///
    /// A timed-out call becomes a failed outcome so the job is still reported.
    async fn dispatch(&self, job: &Job) -> InferenceOutcome {
        info!("Processing job {} through the inference backend", job.id);

        let request = GenerationRequest::from(job);
        let outcome = match tokio::time::timeout(
            self.config.inference_timeout,
            self.inference.generate(&request),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => InferenceOutcome::failure(format!(
                "Inference timed out after {:?}",
                self.config.inference_timeout
            )),
        };

        match &outcome {
            InferenceOutcome::Success(generation) => info!(
                "Job {} succeeded ({} chars)",
                job.id, generation.response_length
            ),
            InferenceOutcome::Failure { error_message } => {
                warn!("Job {} failed: {}", job.id, error_message)
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tether_client::ClientError;
    use tether_core::domain::inference::Generation;
    use tether_core::domain::report::{ResponseMetadata, UsageMetadata};

    use crate::scheduler::RetryPolicy;

    /// What the fake mediator answers to the next poll
    enum PollReply {
        Empty,
        Job(Job),
        ServerError,
        Malformed,
    }

    #[derive(Default)]
    struct FakeJobRepository {
        replies: Mutex<VecDeque<PollReply>>,
        polls: Mutex<usize>,
        submitted: Mutex<Vec<ReportedResult>>,
        reject_submissions: bool,
    }

    impl FakeJobRepository {
        fn with_replies(replies: Vec<PollReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }

        fn rejecting(mut self) -> Self {
            self.reject_submissions = true;
            self
        }

        fn polls(&self) -> usize {
            *self.polls.lock().unwrap()
        }

        fn submitted(&self) -> Vec<ReportedResult> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobRepository for FakeJobRepository {
        async fn poll_job(&self) -> tether_client::Result<Option<Job>> {
            *self.polls.lock().unwrap() += 1;
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(PollReply::Empty);

            match reply {
                PollReply::Empty => Ok(None),
                PollReply::Job(job) => Ok(Some(job)),
                PollReply::ServerError => Err(ClientError::api_error(503, "maintenance")),
                PollReply::Malformed => Err(ClientError::ParseError("expected value".into())),
            }
        }

        async fn submit_result(&self, result: &ReportedResult) -> tether_client::Result<()> {
            self.submitted.lock().unwrap().push(result.clone());
            if self.reject_submissions {
                Err(ClientError::api_error(500, "storage down"))
            } else {
                Ok(())
            }
        }
    }

    struct FakeInference {
        outcome: InferenceOutcome,
        delay: Option<Duration>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeInference {
        fn returning(outcome: InferenceOutcome) -> Self {
            Self {
                outcome,
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn hanging(delay: Duration) -> Self {
            Self {
                outcome: InferenceOutcome::failure("unreachable"),
                delay: Some(delay),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceService for FakeInference {
        async fn generate(&self, request: &GenerationRequest) -> InferenceOutcome {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone()
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn test_config() -> Config {
        let mut config = Config::new(
            "http://mediator.test/api/v1".to_string(),
            "http://localhost:11434".to_string(),
        );
        config.agent_id = "test-agent".to_string();
        config
    }

    fn sample_job(id: &str, max_tokens: u32) -> Job {
        Job {
            id: id.to_string(),
            prompt: "Tell me a joke".to_string(),
            system_prompt: None,
            model: "qwen2.5:7b".to_string(),
            temperature: 0.7,
            max_tokens,
            created_at: chrono::Utc::now(),
        }
    }

    fn hello_outcome() -> InferenceOutcome {
        InferenceOutcome::Success(Generation {
            text: "hello".to_string(),
            response_length: 5,
            input_tokens: 3,
            output_tokens: 5,
            elapsed_ms: 40,
        })
    }

    struct Harness {
        poller: JobPoller,
        jobs: Arc<FakeJobRepository>,
        inference: Arc<FakeInference>,
        sleeper: Arc<RecordingSleeper>,
    }

    fn harness(config: Config, jobs: FakeJobRepository, inference: FakeInference) -> Harness {
        let jobs = Arc::new(jobs);
        let inference = Arc::new(inference);
        let sleeper = Arc::new(RecordingSleeper::default());

        let poller = JobPoller::new(config, jobs.clone(), inference.clone())
            .with_sleeper(sleeper.clone());

        Harness {
            poller,
            jobs,
            inference,
            sleeper,
        }
    }

    #[tokio::test]
    async fn test_empty_poll_makes_no_other_calls() {
        let mut h = harness(
            test_config(),
            FakeJobRepository::with_replies(vec![PollReply::Empty, PollReply::Empty]),
            FakeInference::returning(hello_outcome()),
        );

        assert_eq!(h.poller.run_cycle().await, CycleOutcome::NoJob);
        assert_eq!(h.poller.run_cycle().await, CycleOutcome::NoJob);

        assert_eq!(h.jobs.polls(), 2);
        assert!(h.inference.requests().is_empty());
        assert!(h.jobs.submitted().is_empty());
        assert_eq!(
            h.sleeper.sleeps(),
            vec![
                Duration::from_secs(3),
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(1),
            ]
        );
        assert_eq!(h.poller.iteration(), 2);
    }

    #[tokio::test]
    async fn test_successful_job_is_reported() {
        let mut h = harness(
            test_config(),
            FakeJobRepository::with_replies(vec![PollReply::Job(sample_job("job-b", 2000))]),
            FakeInference::returning(hello_outcome()),
        );

        let outcome = h.poller.run_cycle().await;
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                job_id: "job-b".to_string(),
                success: true,
                delivered: true,
            }
        );

        let requests = h.inference.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "qwen2.5:7b");
        assert_eq!(requests[0].max_tokens, 2000);

        let submitted = h.jobs.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].job_uuid, "job-b");
        assert_eq!(submitted[0].response_text, "hello");
        assert_eq!(submitted[0].error_message, None);
        assert_eq!(
            submitted[0].response_metadata,
            ResponseMetadata::Usage(UsageMetadata {
                input_tokens: 3,
                output_tokens: 5,
                response_time_ms: 40,
            })
        );

        // A completed job skips the poll-interval wait; only the idle pause remains
        assert_eq!(h.sleeper.sleeps(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_failed_inference_is_reported_as_error() {
        let mut h = harness(
            test_config(),
            FakeJobRepository::with_replies(vec![PollReply::Job(sample_job("job-c", 500))]),
            FakeInference::returning(InferenceOutcome::failure("HTTP 500: model crashed")),
        );

        let outcome = h.poller.run_cycle().await;
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                job_id: "job-c".to_string(),
                success: false,
                delivered: true,
            }
        );

        let submitted = h.jobs.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].response_text, "");
        assert_eq!(
            submitted[0].error_message.as_deref(),
            Some("HTTP 500: model crashed")
        );
    }

    #[tokio::test]
    async fn test_inference_timeout_is_reported_as_error() {
        let mut config = test_config();
        config.inference_timeout = Duration::from_millis(50);

        let mut h = harness(
            config,
            FakeJobRepository::with_replies(vec![PollReply::Job(sample_job("job-t", 100))]),
            FakeInference::hanging(Duration::from_secs(5)),
        );

        let outcome = h.poller.run_cycle().await;
        assert!(matches!(
            outcome,
            CycleOutcome::Completed { success: false, delivered: true, .. }
        ));

        let submitted = h.jobs.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].response_text, "");
        assert!(submitted[0].error_message.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_rejected_report_is_not_retried() {
        let mut h = harness(
            test_config(),
            FakeJobRepository::with_replies(vec![
                PollReply::Job(sample_job("job-d", 100)),
                PollReply::Empty,
            ])
            .rejecting(),
            FakeInference::returning(hello_outcome()),
        );

        let outcome = h.poller.run_cycle().await;
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                job_id: "job-d".to_string(),
                success: true,
                delivered: false,
            }
        );
        assert_eq!(h.jobs.submitted().len(), 1);

        // The next cycle polls again as usual
        assert_eq!(h.poller.run_cycle().await, CycleOutcome::NoJob);
        assert_eq!(h.jobs.polls(), 2);
        assert_eq!(h.jobs.submitted().len(), 1);
        assert_eq!(h.inference.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_failures_wait_and_continue() {
        let mut h = harness(
            test_config(),
            FakeJobRepository::with_replies(vec![
                PollReply::ServerError,
                PollReply::Malformed,
                PollReply::Job(sample_job("job-r", 100)),
            ]),
            FakeInference::returning(hello_outcome()),
        );

        assert_eq!(h.poller.run_cycle().await, CycleOutcome::PollFailed);
        assert_eq!(h.poller.run_cycle().await, CycleOutcome::PollFailed);
        assert!(matches!(
            h.poller.run_cycle().await,
            CycleOutcome::Completed { success: true, .. }
        ));

        assert_eq!(h.jobs.submitted().len(), 1);
        assert_eq!(
            h.sleeper.sleeps(),
            vec![
                Duration::from_secs(3),
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ]
        );
    }

    #[tokio::test]
    async fn test_exponential_retry_grows_and_resets() {
        let mut config = test_config();
        config.retry_policy = RetryPolicy::Exponential;
        config.max_retry_delay = Duration::from_secs(10);

        let mut h = harness(
            config,
            FakeJobRepository::with_replies(vec![
                PollReply::ServerError,
                PollReply::ServerError,
                PollReply::ServerError,
                PollReply::Empty,
                PollReply::ServerError,
            ]),
            FakeInference::returning(hello_outcome()),
        );

        for _ in 0..5 {
            h.poller.run_cycle().await;
        }

        let waits: Vec<Duration> = h
            .sleeper
            .sleeps()
            .into_iter()
            .filter(|d| *d != Duration::from_secs(1))
            .collect();

        assert_eq!(
            waits,
            vec![
                Duration::from_secs(3),
                Duration::from_secs(6),
                Duration::from_secs(10),
                Duration::from_secs(3),
                Duration::from_secs(3),
            ]
        );
    }

    #[tokio::test]
    async fn test_one_report_per_leased_job_over_many_cycles() {
        let replies = (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    PollReply::Job(sample_job(&format!("job-{}", i), 100))
                } else {
                    PollReply::Empty
                }
            })
            .collect();

        let mut h = harness(
            test_config(),
            FakeJobRepository::with_replies(replies),
            FakeInference::returning(hello_outcome()),
        );

        for _ in 0..20 {
            h.poller.run_cycle().await;
        }

        let submitted: Vec<String> = h
            .jobs
            .submitted()
            .into_iter()
            .map(|r| r.job_uuid)
            .collect();

        assert_eq!(h.jobs.polls(), 20);
        assert_eq!(h.inference.requests().len(), 7);
        assert_eq!(
            submitted,
            vec!["job-0", "job-3", "job-6", "job-9", "job-12", "job-15", "job-18"]
        );
    }
}
