//! Retry policy for downloads with error classification.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for one download.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that another attempt will not fix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NonRetryableError {
    #[error("Not found (HTTP 404): {0}")]
    NotFound(String),
    #[error("Authentication required (HTTP 401): {0}")]
    AuthenticationFailed(String),
    #[error("Access forbidden (HTTP 403): {0}")]
    Forbidden(String),
    #[error("Rate limited (HTTP 429): {0}")]
    RateLimited(String),
    #[error("Request error (HTTP {status}): {url}")]
    ClientError { status: u16, url: String },
}

/// Failure writing the downloaded body to its local destination.
/// Carried as anyhow context over the underlying error.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct LocalWriteError(pub &'static str);

/// Classify a failed response status.
///
/// 4xx statuses are final; 5xx and transport failures are retried.
pub fn classify_status(status: StatusCode, url: &str) -> Result<(), NonRetryableError> {
    match status {
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url.to_string())),
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(url.to_string())),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(url.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimited(url.to_string())),
        s if s.is_client_error() => Err(NonRetryableError::ClientError {
            status: s.as_u16(),
            url: url.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Convert an error from `error_for_status()` into an `anyhow::Error`,
/// substituting a [`NonRetryableError`] when the status is final.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "<unknown url>".to_string());
    match error.status().map(|status| classify_status(status, &url)) {
        Some(Err(non_retryable)) => anyhow::Error::from(non_retryable),
        _ => anyhow::Error::from(error),
    }
}

/// Whether an attempt that failed with `e` is worth repeating.
pub fn is_retryable(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none() && e.downcast_ref::<LocalWriteError>().is_none()
}
