//! Internal error helpers for mapping HTTP/reqwest errors to [`ReasoningError`].

use flow0::duration::DurationMs;
use flow0::error::ReasoningError;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Map a non-success HTTP status from the Anthropic API to a [`ReasoningError`].
///
/// Reference: <https://docs.anthropic.com/en/api/errors>
pub(crate) fn map_http_status(
    status: reqwest::StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> ReasoningError {
    match status.as_u16() {
        401 | 403 => ReasoningError::Auth(body.to_string()),
        // 529 is Anthropic's overloaded status
        429 | 529 => ReasoningError::Quota {
            retry_after: parse_retry_after(headers),
        },
        _ => ReasoningError::Transport(format!("HTTP {status}: {body}")),
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

/// Map a [`reqwest::Error`] to a [`ReasoningError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ReasoningError {
    if err.is_timeout() {
        ReasoningError::Timeout(err.to_string())
    } else if err.is_decode() {
        ReasoningError::InvalidOutput(err.to_string())
    } else {
        ReasoningError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use reqwest::header::HeaderValue;

    #[test]
    fn auth_statuses() {
        let h = HeaderMap::new();
        assert_eq!(
            map_http_status(StatusCode::UNAUTHORIZED, &h, "bad key"),
            ReasoningError::Auth("bad key".into())
        );
        assert!(matches!(
            map_http_status(StatusCode::FORBIDDEN, &h, ""),
            ReasoningError::Auth(_)
        ));
    }

    #[test]
    fn quota_reads_retry_after_seconds() {
        let mut h = HeaderMap::new();
        h.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(
            map_http_status(StatusCode::TOO_MANY_REQUESTS, &h, ""),
            ReasoningError::Quota {
                retry_after: Some(DurationMs::from_secs(3))
            }
        );
        let overloaded = StatusCode::from_u16(529).unwrap();
        assert_eq!(
            map_http_status(overloaded, &HeaderMap::new(), ""),
            ReasoningError::Quota { retry_after: None }
        );
    }

    #[test]
    fn http_date_retry_after_is_ignored() {
        let mut h = HeaderMap::new();
        h.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&h), None);
    }

    #[test]
    fn other_statuses_are_transport() {
        assert!(matches!(
            map_http_status(StatusCode::INTERNAL_SERVER_ERROR, &HeaderMap::new(), "boom"),
            ReasoningError::Transport(msg) if msg.contains("boom")
        ));
    }
}
