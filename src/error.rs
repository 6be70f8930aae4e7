use thiserror::Error;

use crate::transport::TransportError;

/// Why a logical request ultimately failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The envelope carried a code other than 200/401
    #[error("Request failed with code {code}: {message}")]
    Application { code: i64, message: String },

    /// Platform handshake or login exchange failed
    #[error("Login failed: {0}")]
    Login(String),

    /// Refresh exchange failed; the stored credential has been cleared
    #[error("Token refresh failed: {0}")]
    Refresh(String),

    /// The server kept rejecting the credential after refreshing it
    #[error("Credential still rejected after {0} refresh cycle(s)")]
    Unauthorized(u32),

    /// The envelope or its payload did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RequestError {
    /// Only transport and application failures consume the retry budget.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RequestError::Transport(_) | RequestError::Application { .. }
        )
    }
}
