//! Lookup error type, kept typed so retry and aggregation can classify it.

use std::time::Duration;

/// Failure of one lookup request (or of building the client).
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Server URL could not be turned into a threatMatches endpoint. Fatal.
    #[error("invalid server URL {url:?}: {reason}")]
    Endpoint { url: String, reason: String },
    /// Request body could not be serialized.
    #[error("encode request: {0}")]
    Encode(#[source] serde_json::Error),
    /// Curl reported an error (timeout, connection, etc.).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),
    /// Response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Response body was not a valid threatMatches document.
    #[error("malformed response: {0}")]
    Decode(#[source] serde_json::Error),
    /// The lookup did not finish before its deadline.
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
    /// The blocking transfer task panicked or was cancelled.
    #[error("lookup task failed: {0}")]
    Task(String),
}
