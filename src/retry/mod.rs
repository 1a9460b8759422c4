//! Single retry wrapper applied at every external-service boundary.
//!
//! Only errors whose [`Transient::is_transient`] returns `true` are retried. Anything
//! else returns on the first failure so the caller can fall back instead.

pub mod config;


pub use config::RetryPolicy;

use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

/// Classifies an error as worth retrying (rate limit, timeout, temporary outage).
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt failed with a transient error.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// The call failed with an error that retrying cannot fix.
    #[error(transparent)]
    Permanent(E),
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Permanent(_) => 1,
        }
    }

    pub fn inner(&self) -> &E {
        match self {
            RetryError::Exhausted { source, .. } => source,
            RetryError::Permanent(e) => e,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } => source,
            RetryError::Permanent(e) => e,
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails permanently, or the attempt budget
    /// runs out.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + Transient + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(label, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                debug!(label, attempt, error = %err, "Permanent failure, not retrying");
                return Err(RetryError::Permanent(err));
            }

            if attempt >= max_attempts {
                warn!(label, attempts = attempt, error = %err, "Retry budget exhausted");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.delay_for(attempt);
            warn!(label, attempt, ?delay, error = %err, "Transient failure, backing off");
            tokio::time::sleep(delay).await;
        }
    }
}
