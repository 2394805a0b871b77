//! Retry combinator with exponential backoff, jitter and per-attempt timeouts.
//!
//! Cancellation is cooperative: when the token fires, the attempt in flight is
//! dropped (which aborts its I/O) and no further attempt is scheduled.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Exponent cap so that high attempt numbers cannot overflow the multiplier.
pub const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Retry parameters for one operation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failed attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter added to every delay
    pub max_jitter: Duration,
    /// Ceiling on the exponential part of the delay
    pub max_delay: Duration,
    /// Deadline for a single attempt; `None` lets attempts run unbounded
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_jitter: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            attempt_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt number `attempt` (0-based):
    /// `base * 2^attempt + jitter`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        compute_backoff(self.base_delay, attempt, self.max_delay) + jitter(self.max_jitter)
    }
}

/// Exponential part of the backoff, without jitter.
#[inline]
pub fn compute_backoff(base: Duration, attempt: u32, max_delay: Duration) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT));
    base.saturating_mul(factor).min(max_delay)
}

fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

/// Why a single attempt failed
#[derive(Debug)]
pub enum AttemptError<E> {
    Failed(E),
    TimedOut(Duration),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Failed(e) => write!(f, "{}", e),
            AttemptError::TimedOut(d) => write!(f, "attempt timed out after {}ms", d.as_millis()),
        }
    }
}

/// Terminal failure of a retried operation
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E: fmt::Display + fmt::Debug> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptError<E> },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl<E: fmt::Display + fmt::Debug> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts } => *attempts,
        }
    }
}

/// Successful result together with the number of attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Run `operation` until it succeeds, retries are exhausted, or `cancel` fires.
///
/// The closure receives the 0-based attempt number. Each attempt is bounded by
/// `policy.attempt_timeout`; a timeout counts as one failed attempt.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<Retried<T>, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display + fmt::Debug,
{
    let mut attempts = 0_u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempts });
        }

        let call = operation(attempts);
        attempts += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts });
            }
            result = run_attempt(call, policy.attempt_timeout) => result,
        };

        let error = match result {
            Ok(value) => return Ok(Retried { value, attempts }),
            Err(error) => error,
        };

        if attempts > policy.max_retries {
            return Err(RetryError::Exhausted {
                attempts,
                last: error,
            });
        }

        let delay = policy.backoff(attempts - 1);
        tracing::warn!(
            attempt = attempts,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts });
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn run_attempt<T, E, Fut>(call: Fut, timeout: Option<Duration>) -> Result<T, AttemptError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(AttemptError::Failed),
            Err(_) => Err(AttemptError::TimedOut(limit)),
        },
        None => call.await.map_err(AttemptError::Failed),
    }
}
