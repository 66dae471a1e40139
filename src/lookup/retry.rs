use std::thread;
use std::time::Duration;

use super::types::ProviderResult;
use crate::config::LookupConfig;

/// Bounded retry with linearly growing backoff.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Wait after failed attempt n is `n * backoff_step`
    pub backoff_step: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
        }
    }

    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_step())
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    /// Calls `attempt_fn` until it stops failing transiently or the attempt
    /// bound is reached. No wait follows the final attempt.
    pub fn run<F>(&self, label: &str, mut attempt_fn: F) -> ProviderResult
    where
        F: FnMut() -> ProviderResult,
    {
        let mut attempt = 1;
        loop {
            let result = attempt_fn();
            match &result {
                ProviderResult::Failed(err) if err.is_transient() && attempt < self.max_attempts => {
                    let wait = self.backoff(attempt);
                    log::warn!(
                        "{} attempt {}/{} failed: {} (retrying in {:?})",
                        label, attempt, self.max_attempts, err, wait
                    );
                    if !wait.is_zero() {
                        thread::sleep(wait);
                    }
                    attempt += 1;
                }
                _ => return result,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1))
    }
}
