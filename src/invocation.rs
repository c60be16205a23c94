//! Resilient invocation of the generation service.
//!
//! Wraps one remote request with failure classification and bounded
//! exponential backoff. Only rate/quota failures are retried; a response that
//! fails to decode or any other failure ends the call immediately.

use crate::error::{FailureKind, InvocationError, ProviderError};
use crate::provider::{GenerationRequest, GenerationResponse, ModelProviderClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(2000);

const RATE_LIMIT_MARKERS: &[&str] = &["429", "quota", "resource exhausted", "resource_exhausted"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    /// Sleep before the retry that follows failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

/// Single point of failure classification.
pub fn classify_failure(error: &ProviderError) -> FailureKind {
    match error {
        ProviderError::Decode(_) => FailureKind::Malformed,
        ProviderError::Http { status: 429, .. } => FailureKind::RateLimited,
        other => {
            let message = other.to_string().to_lowercase();
            if RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m)) {
                FailureKind::RateLimited
            } else {
                FailureKind::Transport
            }
        }
    }
}

/// Generation client plus retry policy.
#[derive(Clone)]
pub struct ResilientInvoker {
    client: Arc<dyn ModelProviderClient>,
    policy: RetryPolicy,
}

impl ResilientInvoker {
    pub fn new(client: Arc<dyn ModelProviderClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Execute `request`, labelling every failure with `context`.
    pub async fn invoke(
        &self,
        request: &GenerationRequest,
        context: &str,
    ) -> Result<GenerationResponse, InvocationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                context,
                attempt,
                max_attempts,
                provider = self.client.provider_name(),
                "Invoking generation service"
            );

            let failure = match self.client.generate(request).await {
                Ok(response) => return Ok(response),
                Err(failure) => failure,
            };

            match classify_failure(&failure) {
                FailureKind::RateLimited if attempt >= max_attempts => {
                    error!(context, attempts = attempt, error = %failure, "Rate limit retries exhausted");
                    return Err(InvocationError::RateLimited {
                        context: context.to_string(),
                        attempts: attempt,
                    });
                }
                FailureKind::RateLimited => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        context,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit hit, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                FailureKind::Malformed => {
                    error!(context, error = %failure, "Generation response could not be decoded");
                    return Err(InvocationError::Malformed {
                        context: context.to_string(),
                        detail: failure.to_string(),
                    });
                }
                FailureKind::Transport => {
                    error!(context, error = %failure, "Generation call failed");
                    return Err(InvocationError::Transport {
                        context: context.to_string(),
                        detail: failure.to_string(),
                    });
                }
            }
        }
    }
}
