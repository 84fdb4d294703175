use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::warn;

/// Fixed-delay retry: no backoff, no jitter, every error is retryable.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Runs `operation` until it succeeds or the attempts are used up,
    /// returning the last error in the latter case. Zero attempts never calls
    /// `operation`.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("{} failed (attempt {}/{}): {:#}", label, attempt, attempts, e);
                    last_error = Some(e);

                    if attempt < attempts {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("{} made no attempts", label)))
    }
}
