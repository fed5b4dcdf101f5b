//! # Retry Policy
//!
//! Bounded exponential backoff for transient chain failures.
//!
//! Only errors whose [`Retryable::is_retryable`] is true are retried; for
//! chain calls that means [`ChainError::RpcUnavailable`]. Retries happen
//! while building and submitting transactions and while polling for
//! receipts, never at the routine level.
//!
//! # Example
//!
//! ```
//! use blockdag_orchestrator::application::services::retry::{RetryPolicy, retry_chain};
//! use blockdag_orchestrator::infrastructure::chain::ChainError;
//!
//! # async fn example() {
//! let policy = RetryPolicy::single_attempt();
//! let result: Result<u64, ChainError> =
//!     retry_chain(&policy, "eth_blockNumber", || async { Ok(42) }).await;
//! assert_eq!(result.unwrap(), 42);
//! # }
//! ```

use crate::infrastructure::chain::{ChainError, ChainResult};
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Errors that know whether a later attempt may succeed.
pub trait Retryable {
    /// Returns true for transient failures.
    fn is_retryable(&self) -> bool;
}

/// Attempt budget and backoff curve.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts in total, the first one included. Zero behaves as one.
    pub max_attempts: u32,
    /// Wait before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on any single wait.
    pub max_delay: Duration,
    /// Growth of the wait per attempt.
    pub multiplier: f64,
    /// Share of each wait (0.0-1.0) that may be shaved off at random.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from millisecond settings.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
        jitter: f64,
    ) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
            multiplier,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }

    /// A policy that never waits and never retries.
    #[must_use]
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before retry number `retry` (0 is the first retry), without
    /// jitter: `min(base * multiplier^retry, max)`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// The jittered waits between attempts, one per allowed retry.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let retries = self.max_attempts.max(1) - 1;
        (0..retries).map(|retry| self.jittered(self.backoff(retry)))
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let shave: f64 = rand::rng().random::<f64>() * self.jitter;
        delay.mul_f64(1.0 - shave).max(Duration::from_millis(1))
    }
}

/// Why a retried call gave up.
#[derive(Debug, Error)]
pub enum RetryError<E: fmt::Display> {
    /// Every attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Error of the final attempt.
        last: E,
        /// Attempts made.
        attempts: u32,
    },
    /// A failure that retrying cannot fix.
    #[error("permanent failure on attempt {attempts}: {error}")]
    Permanent {
        /// The failure.
        error: E,
        /// Attempts made, this one included.
        attempts: u32,
    },
}

impl<E: fmt::Display> RetryError<E> {
    /// Returns the error of the last attempt.
    #[must_use]
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Permanent { error, .. } => error,
        }
    }

    /// Returns the number of attempts made.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Permanent { attempts, .. } => *attempts,
        }
    }

    /// Returns true if the attempt budget ran out.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Runs `call` until it succeeds, fails permanently or the policy's
/// attempts are spent.
///
/// # Errors
///
/// Returns [`RetryError::Permanent`] on the first non-retryable error and
/// [`RetryError::Exhausted`] once every attempt failed transiently.
pub async fn execute_with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    call_name: &str,
    mut call: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let mut delays = policy.delays();
    let mut attempts = 0u32;

    loop {
        attempts = attempts.saturating_add(1);
        let error = match call().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(call = call_name, attempts, "recovered after retry");
                }
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => {
                return Err(RetryError::Permanent { error, attempts });
            }
            Err(error) => error,
        };

        let Some(delay) = delays.next() else {
            warn!(call = call_name, attempts, error = %error, "retries exhausted");
            return Err(RetryError::Exhausted {
                last: error,
                attempts,
            });
        };
        warn!(
            call = call_name,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "transient failure, retrying"
        );
        sleep(delay).await;
    }
}

/// Retries a chain call on `RpcUnavailable`, handing back the last
/// [`ChainError`] itself.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last transient one once
/// attempts are exhausted.
pub async fn retry_chain<F, Fut, T>(
    policy: &RetryPolicy,
    call_name: &str,
    call: F,
) -> ChainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    execute_with_retry(policy, call_name, call)
        .await
        .map_err(RetryError::into_inner)
}
