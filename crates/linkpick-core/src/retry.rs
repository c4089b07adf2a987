//! Bounded retry with a fixed delay
//!
//! The delay schedule comes from `tokio-retry`; the waiting itself goes
//! through a [`Sleeper`] so tests can observe delays without sleeping.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tracing::warn;

/// Something that can wait
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Final failure of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    /// Attempts made, the first one included
    pub attempts: u32,
    /// Error returned by the last attempt
    pub last_error: E,
}

/// Retry policy: at most `max_attempts` tries, `delay` apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. A `max_attempts` of 0 still runs the operation once.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
        }
    }

    /// Total attempts allowed
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delays between consecutive attempts; one fewer than the attempts.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let gaps = usize::try_from(self.max_attempts.saturating_sub(1)).unwrap_or(usize::MAX);
        FixedInterval::new(self.delay).take(gaps)
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// The closure receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`Exhausted`] carrying the last attempt's error.
    pub async fn run<T, E, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut operation: F,
    ) -> Result<T, Exhausted<E>>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut delays = self.delays();
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let Some(delay) = delays.next() else {
                        return Err(Exhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    };
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Attempt failed, retrying: {e}"
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSleeper;

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let delays: Vec<Duration> = policy.delays().collect();
        assert_eq!(delays, vec![Duration::from_secs(2); 2]);
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(2)).max_attempts(), 1);
        assert_eq!(RetryPolicy::new(1, Duration::from_secs(2)).delays().count(), 0);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt_after_two_delays() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(3, Duration::from_secs(2));

        let result = policy
            .run(&sleeper, |attempt| async move {
                if attempt < 3 {
                    Err(format!("boom {attempt}"))
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(2); 2]);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let result: Result<(), _> = policy
            .run(&sleeper, |attempt| async move { Err(format!("boom {attempt}")) })
            .await;

        assert_eq!(
            result,
            Err(Exhausted {
                attempts: 3,
                last_error: "boom 3".to_string()
            })
        );
        assert_eq!(sleeper.recorded().len(), 2);
    }
}
