//! Model invocation with a per-call timeout and bounded retries.
//!
//! Every call gets its own timeout; a timeout is just another transport
//! failure. A request is attempted at most `1 + max_retry_attempts` times.

use std::time::Duration;

use mindloop_core::error::ProviderError;
use mindloop_core::{AgentConfig, Provider, ProviderRequest, ProviderResponse};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt
    pub max_retry_attempts: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_retry_attempts: config.max_retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retry_attempts.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// Send `request`, retrying transport failures per `policy`.
///
/// Returns the last error once every attempt has failed.
pub async fn complete_with_retry(
    provider: &dyn Provider,
    request: ProviderRequest,
    policy: &RetryPolicy,
) -> Result<ProviderResponse, ProviderError> {
    let attempts = policy.max_attempts();
    let mut last_error = ProviderError::NotConfigured("no attempts made".into());

    for attempt in 1..=attempts {
        debug!(provider = provider.name(), attempt, attempts, "Invoking model");

        match tokio::time::timeout(policy.timeout, provider.complete(request.clone())).await {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(e)) => {
                warn!(provider = provider.name(), attempt, error = %e, "Model call failed");
                last_error = e;
            }
            Err(_) => {
                warn!(
                    provider = provider.name(),
                    attempt,
                    timeout_secs = policy.timeout.as_secs_f64(),
                    "Model call timed out"
                );
                last_error = ProviderError::Timeout(format!(
                    "'{}' did not respond within {:?}",
                    provider.name(),
                    policy.timeout
                ));
            }
        }

        if attempt < attempts && !policy.retry_delay.is_zero() {
            tokio::time::sleep(policy.retry_delay).await;
        }
    }

    Err(last_error)
}
