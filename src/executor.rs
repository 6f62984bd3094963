//! Resilience wrapper for outbound calls to external capabilities.
//!
//! Every call to the LLM backend goes through [`RequestExecutor`], which
//! enforces a processing timeout, retries transient failures with backoff,
//! observes caller-initiated cancellation, and emits progress notifications
//! for an observing front end. The connect timeout lives on the HTTP client
//! itself; the executor owns the (much longer) read/processing deadline.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How an individual call attempt failed, as classified by the operation
/// itself. Only transient failures are ever retried.
#[derive(Debug, Error)]
pub enum CallError {
    /// Network failure, retryable server status, or similar. Worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Definitive rejection or malformed response. Never retried.
    #[error("fatal failure: {0}")]
    Fatal(String),
}

/// Terminal failure of an executed operation.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("operation '{operation}' timed out after {timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("operation '{operation}' cancelled by caller")]
    Cancelled { operation: String },

    #[error("operation '{operation}' failed: {message}")]
    Fatal { operation: String, message: String },

    #[error("operation '{operation}' failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },
}

/// Phase transitions reported while an operation is in flight.
///
/// Purely observational; dropping or ignoring them never affects the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    /// The request is about to be handed to the backend.
    Submitted,
    /// The request is in flight and the executor is waiting for the result.
    AwaitingResult,
    /// A transient failure occurred and the given attempt is starting.
    Retrying { attempt: u32 },
}

/// Retry policy for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (1 = no retries).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Double the delay on each subsequent attempt.
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            exponential: true,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the given attempt (attempt numbering starts at 1;
    /// there is no delay before the first attempt).
    fn delay_before(&self, attempt: u32) -> Duration {
        if self.exponential {
            let exp = attempt.saturating_sub(2).min(16);
            self.initial_backoff * 2u32.pow(exp)
        } else {
            self.initial_backoff
        }
    }
}

enum LastFailure {
    TimedOut,
    Transient(String),
}

/// Executes outbound operations with timeout, retry, and cancellation.
///
/// Cheap to clone; per-request cancellation and progress observation are
/// attached with the builder methods.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    timeout: Duration,
    policy: RetryPolicy,
    cancel: CancellationToken,
    progress: Option<mpsc::UnboundedSender<ExecutionPhase>>,
}

impl RequestExecutor {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            timeout,
            policy,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Attach a cancellation token. Cancelling it makes in-flight and queued
    /// attempts stop promptly with [`ExecutorError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Attach a progress channel receiving [`ExecutionPhase`] transitions.
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<ExecutionPhase>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn notify(&self, phase: ExecutionPhase) {
        if let Some(sender) = &self.progress {
            // A closed receiver just means nobody is watching.
            let _ = sender.send(phase);
        }
    }

    /// Run `call` to completion under this executor's timeout and retry
    /// policy.
    ///
    /// The closure is invoked once per attempt and classifies its own
    /// failures via [`CallError`]: transient failures (and timeouts) are
    /// retried up to the attempt bound with backoff, fatal failures return
    /// immediately.
    pub async fn execute<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ExecutorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let mut last_failure = LastFailure::Transient(String::new());

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                let delay = self.policy.delay_before(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after transient failure"
                );
                self.notify(ExecutionPhase::Retrying { attempt });

                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        return Err(ExecutorError::Cancelled {
                            operation: operation.to_string(),
                        });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            } else {
                self.notify(ExecutionPhase::Submitted);
            }

            self.notify(ExecutionPhase::AwaitingResult);

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(operation, attempt, "caller abandoned request");
                    return Err(ExecutorError::Cancelled {
                        operation: operation.to_string(),
                    });
                }
                outcome = tokio::time::timeout(self.timeout, call()) => outcome,
            };

            match outcome {
                Ok(Ok(value)) => {
                    tracing::debug!(operation, attempt, "operation succeeded");
                    return Ok(value);
                }
                Ok(Err(CallError::Fatal(message))) => {
                    tracing::error!(operation, attempt, error = %message, "fatal failure, not retrying");
                    return Err(ExecutorError::Fatal {
                        operation: operation.to_string(),
                        message,
                    });
                }
                Ok(Err(CallError::Transient(message))) => {
                    tracing::warn!(operation, attempt, error = %message, "transient failure");
                    last_failure = LastFailure::Transient(message);
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        timeout_secs = self.timeout.as_secs(),
                        "attempt timed out"
                    );
                    last_failure = LastFailure::TimedOut;
                }
            }
        }

        match last_failure {
            LastFailure::TimedOut => Err(ExecutorError::Timeout {
                operation: operation.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
            LastFailure::Transient(last_error) => Err(ExecutorError::RetriesExhausted {
                operation: operation.to_string(),
                attempts: self.policy.max_attempts,
                last_error,
            }),
        }
    }
}
