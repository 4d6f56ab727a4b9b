//! Retry aspect with linear backoff.

use crate::cancellation::CancellationToken;
use crate::errors::TubesError;
use crate::filters::{AsyncFilter, Step};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::warn;

/// Retry policy: how many retries follow the first attempt, and the base delay.
///
/// The delay before retry `n` is `slide_time * n`.
///
/// The serialized form stores `slide_time` as whole milliseconds
/// (`slide_time_ms`); sub-millisecond precision is dropped on serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawRetryOptions", into = "RawRetryOptions")]
pub struct RetryOptions {
    max_retries: u32,
    slide_time: Duration,
}

impl RetryOptions {
    /// Creates retry options.
    ///
    /// `slide_time` keeps full precision in memory, but only whole
    /// milliseconds survive serialization.
    ///
    /// # Errors
    ///
    /// Returns [`TubesError::OutOfRange`] if `max_retries` is negative.
    pub fn new(max_retries: i32, slide_time: Duration) -> Result<Self, TubesError> {
        let max_retries = u32::try_from(max_retries).map_err(|_| {
            TubesError::out_of_range("max_retries", "Max retries must be greater than 0.")
        })?;
        Ok(Self {
            max_retries,
            slide_time,
        })
    }

    /// Returns the number of retries after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the base backoff delay.
    #[must_use]
    pub fn slide_time(&self) -> Duration {
        self.slide_time
    }

    /// Returns the delay before retry `attempt` (one-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.slide_time.saturating_mul(attempt)
    }
}

#[derive(Serialize, Deserialize)]
struct RawRetryOptions {
    #[serde(default)]
    max_retries: i64,
    #[serde(default)]
    slide_time_ms: u64,
}

impl TryFrom<RawRetryOptions> for RetryOptions {
    type Error = TubesError;

    fn try_from(raw: RawRetryOptions) -> Result<Self, Self::Error> {
        let max_retries = i32::try_from(raw.max_retries).map_err(|_| {
            TubesError::out_of_range("max_retries", "Max retries must fit in 32 bits.")
        })?;
        Self::new(max_retries, Duration::from_millis(raw.slide_time_ms))
    }
}

impl From<RetryOptions> for RawRetryOptions {
    fn from(options: RetryOptions) -> Self {
        Self {
            max_retries: i64::from(options.max_retries),
            slide_time_ms: u64::try_from(options.slide_time.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Re-runs the wrapped step after a failure with linearly growing delays.
///
/// The attempt counter belongs to the aspect instance and is not reset after a
/// success. Later calls on the same instance therefore get fewer retries; use
/// [`reset`](RetryAspect::reset) or one instance per call chain.
#[derive(Debug)]
pub struct RetryAspect<N> {
    next: N,
    options: RetryOptions,
    attempts: AtomicU32,
}

impl<N> RetryAspect<N> {
    /// Wraps `next` with the given policy.
    pub fn new(next: N, options: RetryOptions) -> Self {
        Self {
            next,
            options,
            attempts: AtomicU32::new(0),
        }
    }

    /// Returns the wrapped step.
    pub fn inner(&self) -> &N {
        &self.next
    }

    /// Returns the policy.
    pub fn options(&self) -> RetryOptions {
        self.options
    }

    /// Returns how many failures this instance has counted.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Clears the failure counter.
    pub fn reset(&self) {
        self.attempts.store(0, Ordering::SeqCst);
    }

    /// Counts a failure and returns the backoff, or `None` once retries are spent.
    fn next_delay(&self) -> Option<Duration> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if attempt > self.options.max_retries {
            return None;
        }
        let delay = self.options.delay_for(attempt);
        warn!(
            attempt,
            max_retries = self.options.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Step failed, retrying"
        );
        Some(delay)
    }
}

impl<M, E, N> Step<M, E> for RetryAspect<N>
where
    N: Step<M, E>,
{
    fn execute(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let Err(error) = self.next.execute(message, cancel) else {
                return Ok(());
            };
            let Some(delay) = self.next_delay() else {
                return Err(error);
            };
            std::thread::sleep(delay);
        }
    }
}

#[async_trait]
impl<M, E, N> AsyncFilter<M, E> for RetryAspect<N>
where
    M: Send,
    E: Send,
    N: AsyncFilter<M, E>,
{
    async fn execute_async(&self, message: &mut M, cancel: &CancellationToken) -> Result<(), E> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let Err(error) = self.next.execute_async(message, cancel).await else {
                return Ok(());
            };
            let Some(delay) = self.next_delay() else {
                return Err(error);
            };
            drop(error);
            if cancel
                .run_until_cancelled(tokio::time::sleep(delay))
                .await
                .is_err()
            {
                return Ok(());
            }
        }
    }
}
