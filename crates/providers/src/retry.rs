//! Retry wrapper — bounded retries with exponential backoff.
//!
//! Wraps another provider and retries transient failures (network errors,
//! timeouts, provider-side rate limits, 5xx responses). Authentication and
//! configuration errors are terminal and surface immediately.

use async_trait::async_trait;
use datagate_core::error::ProviderError;
use datagate_core::provider::{ProviderRequest, ProviderResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A provider that retries transient failures of an inner provider.
pub struct RetryProvider {
    inner: Arc<dyn datagate_core::Provider>,
    attempts: u32,
    base_backoff: Duration,
}

impl RetryProvider {
    /// Wrap `inner` with up to `attempts` tries. Backoff doubles after each
    /// failed attempt, starting from `base_backoff`.
    pub fn new(inner: Arc<dyn datagate_core::Provider>, attempts: u32, base_backoff: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            base_backoff,
        }
    }

    fn is_transient(error: &ProviderError) -> bool {
        match error {
            ProviderError::Network(_) | ProviderError::Timeout(_) => true,
            ProviderError::RateLimited { .. } => true,
            ProviderError::ApiError { status_code, .. } => *status_code >= 500,
            ProviderError::AuthenticationFailed(_) | ProviderError::NotConfigured(_) => false,
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

#[async_trait]
impl datagate_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut last_error = ProviderError::NotConfigured("no attempt made".into());

        for attempt in 0..self.attempts {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if Self::is_transient(&e) => {
                    warn!(
                        provider = %self.inner.name(),
                        attempt = attempt + 1,
                        total = self.attempts,
                        error = %e,
                        "Provider attempt failed"
                    );
                    last_error = e;
                    if attempt + 1 < self.attempts {
                        tokio::time::sleep(self.backoff_for(attempt)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
