//! Error categorization and retry strategy.
//!
//! This module provides functions to categorize errors and configure retry strategies.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::{FetchError, ErrorType};

/// Creates an exponential backoff retry strategy.
///
/// Returns a retry strategy configured with:
/// - Delays of `RETRY_BASE_MS^n * RETRY_FACTOR` milliseconds (1s, 2s, 4s, ...)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
/// - `max_retries` delays, i.e. `max_retries + 1` attempts in total
///
/// # Returns
///
/// A retry strategy iterator ready for use with `tokio_retry::RetryIf`.
pub fn get_retry_strategy(max_retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::RETRY_BASE_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .take(max_retries)
}

/// Categorizes a `reqwest::Error` into an `ErrorType`.
///
/// # Arguments
///
/// * `error` - The `reqwest::Error` to categorize
///
/// # Returns
///
/// The appropriate `ErrorType` for the error.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ErrorType {
    if let Some(status) = error.status() {
        match status.as_u16() {
            403 => return ErrorType::HttpRequestForbidden,
            404 => return ErrorType::HttpRequestNotFound,
            429 => return ErrorType::HttpRequestTooManyRequests,
            _ if status.is_client_error() => return ErrorType::HttpRequestClientError,
            _ if status.is_server_error() => return ErrorType::HttpRequestServerError,
            _ => {}
        }
    }

    if error.is_timeout() {
        ErrorType::HttpRequestTimeoutError
    } else if error.is_connect() {
        ErrorType::HttpRequestConnectError
    } else {
        ErrorType::HttpRequestOtherError
    }
}

/// Categorizes a download failure into an `ErrorType`.
pub fn categorize_fetch_error(error: &FetchError) -> ErrorType {
    match error {
        FetchError::Http(e) => categorize_reqwest_error(e),
        FetchError::HtmlPayload => ErrorType::ContentHtmlPayload,
        FetchError::BodyTooLarge(_) => ErrorType::ContentTooLarge,
        FetchError::Io(_) => ErrorType::FileWriteError,
        FetchError::Store(_) => ErrorType::StoreWriteError,
    }
}
