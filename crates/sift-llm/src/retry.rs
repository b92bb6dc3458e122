use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::LlmError;

const FIRST_DELAY_MS: u64 = 500;
const DELAY_CAP_MS: u64 = 20_000;

/// Statuses worth another attempt: rate limiting and gateway hiccups.
fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Delay before retry number `attempt` (zero-based).
///
/// A numeric `Retry-After` header wins over the doubling schedule; both are
/// capped.
fn delay_for(retry_after: Option<&reqwest::header::HeaderValue>, attempt: u32) -> Duration {
    let hinted = retry_after
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000));
    let ms = hinted.unwrap_or_else(|| {
        FIRST_DELAY_MS
            .checked_shl(attempt)
            .filter(|ms| *ms >= FIRST_DELAY_MS)
            .unwrap_or(DELAY_CAP_MS)
    });
    Duration::from_millis(ms.min(DELAY_CAP_MS))
}

/// Open a request, trying again up to `max_retries` times on transient
/// statuses.
///
/// Only opening the response is retried. A body that is already streaming
/// belongs to the caller and is never replayed.
///
/// # Errors
///
/// `LlmError::RateLimited` if the last attempt is still throttled,
/// `LlmError::Http` on transport failure. Any other final status is handed
/// back as a response for the caller to report.
pub(crate) async fn send_with_retry<F, Fut>(
    provider: &str,
    max_retries: u32,
    mut send: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let response = send().await?;
        let status = response.status();
        if !is_transient(status) || attempt == max_retries {
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Ok(response);
        }
        let delay = delay_for(response.headers().get(reqwest::header::RETRY_AFTER), attempt);
        attempt += 1;
        tracing::warn!(
            provider,
            %status,
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "transient response, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
