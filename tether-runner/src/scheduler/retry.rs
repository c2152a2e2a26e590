//! Delay between failed polls

use clap::ValueEnum;
use std::time::Duration;

/// How the wait after a failed poll evolves over consecutive failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RetryPolicy {
    /// Always wait one poll interval
    Flat,
    /// Double the wait on each consecutive failure, up to a cap
    Exponential,
}

/// Tracks consecutive poll failures and yields the next wait
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    policy: RetryPolicy,
    base: Duration,
    max: Duration,
    consecutive_failures: u32,
}

impl RetryBackoff {
    pub fn new(policy: RetryPolicy, base: Duration, max: Duration) -> Self {
        Self {
            policy,
            base,
            max,
            consecutive_failures: 0,
        }
    }

    /// Records a failure and returns how long to wait before polling again
    pub fn next_delay(&mut self) -> Duration {
        let delay = match self.policy {
            RetryPolicy::Flat => self.base,
            RetryPolicy::Exponential => {
                // Exponent capped so the factor cannot overflow
                let factor = 2u32.pow(self.consecutive_failures.min(16));
                self.base.saturating_mul(factor).min(self.max)
            }
        };

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        delay
    }

    /// Forgets previous failures after a successful poll
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    #[allow(dead_code)]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
