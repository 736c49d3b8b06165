//! Retry logic with exponential backoff
//!
//! The policy is a plain value owned by the client; [`retry`] is an explicit
//! loop that stops on success, on a non-retryable error, or once
//! `max_retries` retries have been spent.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// HTTP statuses treated as transient
///
/// Request timeout, too early, rate limiting, and gateway/server failures.
pub const RETRYABLE_STATUSES: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

/// Check if an HTTP status should be retried
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// A policy that performs a single attempt
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Set the first backoff delay and the cap applied to every delay
    pub fn with_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    /// Total number of exchanges a call may perform
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before retry number `retry` (zero-based)
    pub fn delay_for(&self, retry: usize) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);

        // NaN and overflow both saturate to the cap
        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }

        Duration::from_millis(delay_ms as u64)
    }
}

/// Retry an async operation with a configurable retry policy
///
/// `should_retry` decides whether a failure is transient. The last error is
/// returned when the policy is exhausted.
///
/// # Examples
/// ```
/// use audittrail_client::retry::{retry, RetryPolicy};
///
/// async fn example() -> Result<String, String> {
///     let policy = RetryPolicy::new(3);
///
///     retry(
///         &policy,
///         |err: &String| err.contains("temporary"),
///         || async {
///             // Your operation here
///             Ok("success".to_string())
///         },
///     )
///     .await
/// }
/// ```
pub async fn retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut retries = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !should_retry(&err) || retries >= policy.max_retries {
                    return Err(err);
                }

                let delay = policy.delay_for(retries);
                retries += 1;
                warn!(
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
