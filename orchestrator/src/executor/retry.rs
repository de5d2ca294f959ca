//! Bounded retry for executor calls

use std::future::Future;

use tracing::warn;

use crate::errors::OrchestratorError;
use crate::utils::{calc_exp_backoff, CooldownOptions};

/// Retry policy options
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Backoff between attempts
    pub cooldown: CooldownOptions,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown: CooldownOptions::default(),
        }
    }
}

/// Wraps every executor call with bounded retry and exponential backoff.
///
/// Only transport-class failures are retried. Application-level
/// rejections surface immediately: the backend saw the request and said
/// no, so sending it again cannot change the answer. Once the attempt
/// budget is spent the failure surfaces as ExecutorUnavailable.
#[derive(Debug, Clone, Default)]
pub struct RetryingCaller {
    options: RetryOptions,
}

impl RetryingCaller {
    /// Create a caller with the given retry policy
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    /// Run an executor call, retrying transient failures
    pub async fn call<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, OrchestratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OrchestratorError>>,
    {
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(OrchestratorError::ExecutorUnavailable(format!(
                            "{} failed after {} attempts: {}",
                            operation, attempt, err
                        )));
                    }

                    let delay = calc_exp_backoff(&self.options.cooldown, attempt - 1);
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation, attempt, max_attempts, delay, err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
