//! Call policy for provider HTTP work: retry with exponential back-off and
//! jitter, and an overall deadline per provider call.
//!
//! Only connection-level failures, 5xx responses and 429s are retried.
//! Timeouts are not: a provider that ran out of time fails rather
//! than stretching the analysis past its bound.

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Connection failures (refused, reset, DNS).
/// - HTTP 5xx and 429 responses.
///
/// **Not retriable:**
/// - Timeouts, 404 and other 4xx statuses.
/// - Malformed payloads ([`ProviderError::Deserialize`], [`ProviderError::Xml`]).
/// - Configuration problems ([`ProviderError::MissingCredential`],
///   [`ProviderError::InvalidBaseUrl`]), [`ProviderError::NoData`] and
///   [`ProviderError::Timeout`].
pub(crate) fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Http(e) => !e.is_timeout() && (e.is_connect() || e.is_request()),
        ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        ProviderError::RateLimited { .. } => true,
        ProviderError::Deserialize { .. }
        | ProviderError::Xml { .. }
        | ProviderError::NotFound { .. }
        | ProviderError::MissingCredential(_)
        | ProviderError::InvalidBaseUrl { .. }
        | ProviderError::NoData(_)
        | ProviderError::Timeout { .. } => false,
    }
}

/// Bounds a whole provider call, every request and retry included, by
/// `deadline`.
pub(crate) async fn with_deadline<T, Fut>(
    provider: &'static str,
    deadline: Duration,
    call: Fut,
) -> Result<T, ProviderError>
where
    Fut: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider,
            after_secs: deadline.as_secs(),
        }),
    }
}

/// Upper bound on a single back-off sleep.
const MAX_DELAY_MS: u64 = 10_000;

/// Sleep before retry number `retry` (1-based): `base * 2^(retry-1)`,
/// capped at [`MAX_DELAY_MS`], scaled by `jitter` in `[0.75, 1.25)`.
fn backoff_delay(retry: u32, backoff_base_ms: u64, jitter: f64) -> Duration {
    let exponent = retry.saturating_sub(1).min(10);
    let capped = backoff_base_ms
        .saturating_mul(1u64 << exponent)
        .min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let millis = (capped as f64 * jitter) as u64;
    Duration::from_millis(millis)
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
///
/// With `backoff_base_ms = 500` the sleeps are roughly 500 ms, 1 s, 2 s
/// (each ±25 %), never longer than 10 s. Non-retriable errors return on the
/// first attempt.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retries == max_retries || !is_retriable(&err) {
            return Err(err);
        }
        retries += 1;
        let delay = backoff_delay(retries, backoff_base_ms, 0.75 + rand::random::<f64>() * 0.5);
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient provider error, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
