//! Error retriability for downloads.

use crate::error_handling::FetchError;

/// Determines if a download failure is retriable (should be retried).
///
/// Only transient failures that might succeed on a later attempt are retried.
///
/// # Retriable Errors
///
/// - Network timeouts (`reqwest::Error::is_timeout()`)
/// - Connection failures (`reqwest::Error::is_connect()`)
/// - Request errors (`reqwest::Error::is_request()`)
/// - Server errors (5xx HTTP status codes)
/// - Rate limiting (429 Too Many Requests)
///
/// # Non-Retriable Errors
///
/// - Client errors (4xx HTTP status codes, except 429)
/// - Redirect and decode errors
/// - Content errors (HTML payload, oversized body); the server answered, it
///   just did not answer with JavaScript
/// - Local I/O and store errors
pub(crate) fn is_retriable_error(error: &FetchError) -> bool {
    match error {
        FetchError::Http(reqwest_err) => is_retriable_reqwest_error(reqwest_err),
        FetchError::HtmlPayload
        | FetchError::BodyTooLarge(_)
        | FetchError::Io(_)
        | FetchError::Store(_) => false,
    }
}

fn is_retriable_reqwest_error(reqwest_err: &reqwest::Error) -> bool {
    if let Some(status) = reqwest_err.status() {
        let status_code = status.as_u16();

        // 429 (Too Many Requests) is retriable with backoff
        if status_code == crate::config::HTTP_STATUS_TOO_MANY_REQUESTS {
            return true;
        }

        // Permanent client errors (4xx except 429)
        if (400..500).contains(&status_code) {
            return false;
        }

        if (500..600).contains(&status_code) {
            return true;
        }
    }

    if reqwest_err.is_timeout() || reqwest_err.is_connect() || reqwest_err.is_request() {
        return true;
    }

    if reqwest_err.is_redirect() || reqwest_err.is_decode() || reqwest_err.is_builder() {
        return false;
    }

    // Unknown transport errors might be transient
    true
}

/// True when a failure is a network failure, i.e. the origin never gave us a
/// usable response. Only these trigger alternate-path inference.
pub(crate) fn is_network_error(error: &FetchError) -> bool {
    matches!(error, FetchError::Http(_))
}
