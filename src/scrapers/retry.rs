//! Bounded retry for network failures.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// How often a failed network operation is repeated.
///
/// Only `Network` errors are retried; parse and filesystem errors are
/// returned on the first attempt. When retries run out the last error is
/// returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `op`, repeating it while it fails with a network error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_network() && attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        "{} (retry {}/{} for {})",
                        e,
                        attempt,
                        self.retries,
                        what
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
