//! Bounded retry policy shared by all external-call sites.
//!
//! Every retryable interaction with an external tool or service goes through
//! one `RetryPolicy` instead of ad hoc per-call-site loops.

use crate::error::CoreResult;
use std::thread;
use std::time::Duration;

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `backoff * n` before retrying.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` until it succeeds or `max_attempts` is reached; the final
    /// error is returned unchanged.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> CoreResult<T>
    where
        F: FnMut() -> CoreResult<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt < attempts {
                        log::warn!("{what} failed (attempt {attempt}/{attempts}): {err}");
                        thread::sleep(self.backoff * attempt);
                    } else {
                        log::error!("{what} failed after {attempts} attempts: {err}");
                    }
                    last_err = Some(err);
                }
            }
        }
        // attempts >= 1, so at least one error was recorded
        Err(last_err.expect("retry loop ran at least once"))
    }
}
