//! Retry classification for webhook delivery.
//!
//! Connection errors, timeouts, 5xx and 429 are transient. Any other
//! non-2xx answer means the request itself is wrong and will not improve
//! on a second try.

use reqwest::StatusCode;

/// Whether a response status warrants another attempt.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Whether a transport-level error warrants another attempt.
pub fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
