//! Retry with exponential backoff for NAV API calls.
//!
//! Only transport failures and 5xx answers are retried. Validation and
//! authentication errors are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use super::error::GatewayError;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
pub const BASE_DELAY_MS: u64 = 200;

pub(crate) fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt)))
}

/// Run `f` up to `max_retries + 1` times while it fails with a retryable error.
pub(crate) async fn with_retry<T, F, Fut>(
    max_retries: u32,
    endpoint: &str,
    mut f: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    for attempt in 0..max_retries {
        match f().await {
            Err(e) if e.is_retryable() => {
                let delay = backoff(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    endpoint,
                    "NAV request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
    f().await
}
