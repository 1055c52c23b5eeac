//! Classify lookup failures into retry policy error kinds.

use super::policy::ErrorKind;
use crate::lookup::LookupError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::ServerError(code),
        _ => ErrorKind::Permanent,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Permanent
}

/// Classify a lookup error into an ErrorKind.
///
/// Malformed payloads, encoding problems and bad endpoints are never retried.
pub fn classify(e: &LookupError) -> ErrorKind {
    match e {
        LookupError::Transport(ce) => classify_curl_error(ce),
        LookupError::Http(code) => classify_http_status(*code),
        LookupError::Timeout(_) => ErrorKind::Timeout,
        LookupError::Endpoint { .. }
        | LookupError::Encode(_)
        | LookupError::Decode(_)
        | LookupError::Task(_) => ErrorKind::Permanent,
    }
}
