//! Waiting between poll cycles
//!
//! All waits of the poll loop go through [`Sleeper`] so tests can drive many
//! cycles without real delays and inspect what the loop asked for.

use async_trait::async_trait;
use std::time::Duration;

/// Source of the poll loop's pauses
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
