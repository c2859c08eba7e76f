//! HTTP retry policy with exponential backoff.
//!
//! # Retry Policy
//!
//! - Max retries: 2 (3 total attempts)
//! - Initial delay: 500ms
//! - Max delay: 8 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//!
//! # Retryable Conditions
//!
//! - HTTP 408, 409, 429, 5xx
//! - Connection/timeout errors
//! - `Retry-After` honored when present and under 60 seconds

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, header::HeaderMap};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the initial request).
    pub max_retries: u32,
    /// Initial backoff delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    /// Single-attempt configuration (no retries).
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Parse a `Retry-After` header.
///
/// Returns `Some(duration)` for a valid integer-seconds value with
/// `0 < duration < 60s`; `None` otherwise.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers
        .get("retry-after")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;
    let duration = Duration::from_secs(secs);
    (duration > Duration::ZERO && duration < Duration::from_secs(60)).then_some(duration)
}

#[must_use]
pub fn should_retry(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 409 | 429 | 500..=599)
}

/// Calculate retry delay with exponential backoff and jitter.
///
/// - `backoff_step`: 0 before the first retry, 1 before the second, etc.
/// - Respects `Retry-After` if present and valid.
#[must_use]
pub fn calculate_retry_delay(
    backoff_step: u32,
    config: &RetryConfig,
    headers: Option<&HeaderMap>,
) -> Duration {
    if let Some(headers) = headers
        && let Some(delay) = parse_retry_after(headers)
    {
        return delay;
    }

    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Down-jitter: multiply by a random factor in [1 - jitter_factor, 1.0]
    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

/// Outcome of a retry operation.
///
/// A sum type that structurally distinguishes success from failure, so
/// callers cannot accidentally treat an error response as success.
#[derive(Debug)]
pub enum RetryOutcome {
    /// Request succeeded (2xx status).
    Success(Response),
    /// Request failed with an HTTP error after exhausting retries.
    /// The response is provided for error body inspection.
    HttpError(Response),
    /// Request failed with a connection/transport error after exhausting retries.
    ConnectionError {
        attempts: u32,
        source: reqwest::Error,
    },
    /// Request failed with a non-retryable connection error on the first attempt.
    NonRetryable(reqwest::Error),
}

/// Send a request with automatic retries.
///
/// `build_request` is called once per attempt; `reqwest::RequestBuilder`
/// is not reusable across sends.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    for retry_count in 0..config.max_retries {
        match build_request().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return RetryOutcome::Success(response);
                }

                if should_retry(status) {
                    let delay = calculate_retry_delay(retry_count, config, Some(response.headers()));
                    tracing::debug!(
                        status = %status,
                        retry_count = retry_count + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying request after error status"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                return RetryOutcome::HttpError(response);
            }
            Err(e) => {
                if is_retryable_error(&e) {
                    let delay = calculate_retry_delay(retry_count, config, None);
                    tracing::debug!(
                        error = %e,
                        retry_count = retry_count + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying request after connection error"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                if retry_count == 0 {
                    return RetryOutcome::NonRetryable(e);
                }
                return RetryOutcome::ConnectionError {
                    attempts: retry_count + 1,
                    source: e,
                };
            }
        }
    }

    // Final attempt: no more retries possible
    match build_request().send().await {
        Ok(response) => {
            if response.status().is_success() {
                RetryOutcome::Success(response)
            } else {
                RetryOutcome::HttpError(response)
            }
        }
        Err(e) => {
            if config.max_retries == 0 {
                RetryOutcome::NonRetryable(e)
            } else {
                RetryOutcome::ConnectionError {
                    attempts: config.max_retries + 1,
                    source: e,
                }
            }
        }
    }
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}
