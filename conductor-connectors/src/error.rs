//! Internal helpers mapping HTTP/reqwest errors to [`ConnectorError`].

use flow0::duration::DurationMs;
use flow0::error::ConnectorError;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Map a non-success HTTP status to a [`ConnectorError`].
pub(crate) fn map_http_status(
    status: reqwest::StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> ConnectorError {
    match status.as_u16() {
        401 | 403 => ConnectorError::Auth(format!("HTTP {status}: {body}")),
        429 => ConnectorError::RateLimit {
            retry_after: parse_retry_after(headers),
        },
        _ => ConnectorError::Transport(format!("HTTP {status}: {body}")),
    }
}

/// `Retry-After` in whole seconds. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<DurationMs> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(DurationMs::from_secs)
}

/// Map a [`reqwest::Error`] to a [`ConnectorError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ConnectorError {
    if err.is_timeout() {
        ConnectorError::Timeout(err.to_string())
    } else {
        ConnectorError::Transport(err.to_string())
    }
}
