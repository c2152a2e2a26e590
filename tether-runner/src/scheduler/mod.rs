//! Scheduler layer for the runner
//!
//! This layer owns the poll cycle: asking the mediator for work, dispatching a
//! leased job to the inference backend and reporting the outcome. Exactly one
//! job is in flight at a time.

mod poller;
mod retry;
mod sleeper;

pub use poller::JobPoller;
pub use retry::{RetryBackoff, RetryPolicy};
pub use sleeper::{Sleeper, TokioSleeper};
