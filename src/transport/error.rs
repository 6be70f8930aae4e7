//! Transport failure classification.

use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by a [`Transport`](super::Transport). All of them are
/// retryable from the orchestrator's point of view.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Connection refused, reset, DNS failure and the like
    #[error("Network error: {0}")]
    Network(String),
    /// The fixed request timeout elapsed
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Non-2xx status without a response envelope
    #[error("HTTP {status} error")]
    Status { status: u16 },
    /// Response body is not valid JSON
    #[error("Failed to decode response body: {0}")]
    Decode(String),
    /// The request could not be built (bad URL, bad header)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maps a reqwest error onto the transport taxonomy.
pub fn classify_error(error: &reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout(timeout);
    }
    if let Some(status) = error.status() {
        return TransportError::Status {
            status: status.as_u16(),
        };
    }
    if error.is_builder() {
        return TransportError::InvalidRequest(error.to_string());
    }
    if error.is_decode() {
        return TransportError::Decode(error.to_string());
    }

    TransportError::Network(error.to_string())
}
