//! Retry utilities.
//!
//! Model providers rate-limit and occasionally return 5xx responses. Calls are
//! retried with exponential backoff when the error reports itself as transient.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (0 means no retries)
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    /// Backoff multiplier (e.g., 2.0 for doubling)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

impl RetryConfig {
    /// Create a doubling backoff configuration.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Set the maximum delay between retries.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

/// Errors that can tell whether retrying may help
pub trait Transient {
    /// Whether the failure is temporary (rate limit, timeout, 5xx)
    fn is_transient(&self) -> bool;
}

/// Retry an async operation while it fails with a transient error.
///
/// # Examples
///
/// ```no_run
/// use exam_bench_common::retry::{retry_transient, RetryConfig, Transient};
///
/// #[derive(Debug)]
/// struct Busy;
///
/// impl std::fmt::Display for Busy {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "busy")
///     }
/// }
///
/// impl Transient for Busy {
///     fn is_transient(&self) -> bool {
///         true
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let result = retry_transient(&RetryConfig::default(), || async { Err::<(), _>(Busy) }).await;
///     assert!(result.is_err());
/// }
/// ```
pub async fn retry_transient<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + std::fmt::Display,
{
    let mut retry = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && retry < config.max_attempts => {
                retry += 1;
                let delay = config.delay_for(retry);
                tracing::debug!(
                    attempt = retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying after transient error"
                );
                sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
