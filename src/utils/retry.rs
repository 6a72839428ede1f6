/// Retry utilities for transient failures with randomised backoff
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for retry operations
pub struct RetryConfig {
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub description: String,
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(
        max_attempts: u32,
        min_backoff: Duration,
        max_backoff: Duration,
        description: impl Into<String>,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_backoff,
            max_backoff: max_backoff.max(min_backoff),
            description: description.into(),
        }
    }

    /// Run an operation until it succeeds, fails permanently, or attempts run out
    ///
    /// `is_retryable` decides whether an error is worth another attempt. The
    /// last error is returned once attempts are exhausted.
    pub async fn run<F, Fut, T, E, R>(&self, operation: F, is_retryable: R) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        R: Fn(&E) -> bool,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_retryable(&e) => {
                    warn!("{} failed: {}", self.description, e);
                    let backoff = self.backoff();
                    info!(
                        "Waiting {}s before trying again ({}/{})",
                        backoff.as_secs(),
                        attempt,
                        self.max_attempts
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Random delay within the configured bounds
    fn backoff(&self) -> Duration {
        if self.max_backoff <= self.min_backoff {
            return self.min_backoff;
        }
        let min = self.min_backoff.as_millis() as u64;
        let max = self.max_backoff.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}
