//! Retrying calls that fail transiently

use log::{debug, info, warn};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::backoff::Backoff;
use crate::stop::StopListener;

/// How many times to try, and how long to wait in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, the first one included
    pub max_attempts: u32,
    pub step: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Wait `step * attempt` after each failed attempt
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts,
            step,
            backoff: Backoff::Linear,
        }
    }

    pub fn fixed(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts,
            step,
            backoff: Backoff::Fixed,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(self.step, attempt)
    }
}

/// Errors that tell whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Runs an async operation under a [`RetryPolicy`]
pub struct RetryExecutor {
    policy: RetryPolicy,
    stop: Option<StopListener>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, stop: None }
    }

    /// Give up waiting between attempts once `stop` fires
    pub fn with_stop(mut self, stop: StopListener) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut stop = self.stop.clone();
        let mut attempt = 1;

        loop {
            let error = match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Succeeded on attempt {}", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                debug!("Not retrying: {}", error);
                return Err(RetryError::NonRetryableError(error));
            }
            if attempt >= self.policy.max_attempts {
                warn!("Giving up after {} attempts: {}", attempt, error);
                return Err(RetryError::MaxAttemptsExceeded {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.policy.delay_for_attempt(attempt);
            warn!("Attempt {} failed: {}. Retrying in {:?}", attempt, error, delay);

            let waited = match stop.as_mut() {
                Some(listener) => listener.sleep(delay).await,
                None => {
                    sleep(delay).await;
                    true
                }
            };
            if !waited {
                return Err(RetryError::Stopped {
                    attempts: attempt,
                    last_error: error,
                });
            }

            attempt += 1;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Maximum retry attempts ({attempts}) exceeded. Last error: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: E },

    #[error("Non-retryable error: {0}")]
    NonRetryableError(E),

    /// The run was stopped between two attempts
    #[error("Stopped after {attempts} attempts. Last error: {last_error}")]
    Stopped { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::MaxAttemptsExceeded { last_error, .. }
            | RetryError::Stopped { last_error, .. } => last_error,
            RetryError::NonRetryableError(error) => error,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::MaxAttemptsExceeded { attempts, .. } | RetryError::Stopped { attempts, .. } => *attempts,
            RetryError::NonRetryableError(_) => 1,
        }
    }
}
