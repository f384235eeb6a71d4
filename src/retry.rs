//! Bounded retry with a fixed wait between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Waits between attempts. Production code uses [`TokioSleeper`]; tests
/// substitute a recorder so retry timing can be asserted without sleeping.
pub trait Sleeper {
    async fn sleep(&self, delay: Duration);
}

pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after each failed attempt except the last.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Returned when every attempt failed; carries the last error.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Runs `op` until it succeeds or `policy.max_attempts` attempts have failed.
/// `op` receives the zero-based attempt number. A policy of zero attempts
/// still runs once.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &impl Sleeper,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    error = %e,
                    "attempt failed"
                );
                if attempt + 1 >= max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt + 1,
                        last: e,
                    });
                }
                debug!(delay_ms = policy.delay.as_millis() as u64, "retrying after delay");
                sleeper.sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}
