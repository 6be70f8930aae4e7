//! Credential acquisition: the login handshake and the refresh exchange.
//!
//! Both exchanges are unauthenticated POSTs answering with an envelope whose
//! payload is `{ "token": "..." }`. Neither retries; retry policy belongs to
//! the request orchestrator.

mod login;
mod platform;
mod refresh;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::envelope::ResponseEnvelope;
use crate::transport::{HttpRequest, Method, Transport};

pub use login::login;
pub use platform::{ENV_LOGIN_CODE, PromptLogin};
pub use refresh::refresh;

/// Platform capability that issues a one-time code for the login exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformLogin: Send + Sync {
    async fn obtain_code(&self) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub old_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenPayload {
    pub token: String,
}

/// Posts `body` to `path` without credentials and extracts the issued token.
/// Errors are plain messages; callers wrap them into their own variant.
pub(crate) async fn exchange_token<B: Serialize>(
    transport: &dyn Transport,
    path: &str,
    body: &B,
) -> Result<String, String> {
    let body = serde_json::to_value(body).map_err(|e| format!("invalid payload: {}", e))?;
    let request = HttpRequest {
        method: Method::Post,
        path: path.to_string(),
        headers: Vec::new(),
        body: Some(body),
    };

    let response = transport
        .send(&request)
        .await
        .map_err(|e| e.to_string())?;
    let envelope = ResponseEnvelope::from_body(response.body).map_err(|e| e.to_string())?;
    if !envelope.is_success() {
        return Err(format!(
            "{} (code {})",
            envelope.failure_message(),
            envelope.code
        ));
    }

    let payload: ResponseEnvelope<TokenPayload> = envelope.decode().map_err(|e| e.to_string())?;
    match payload.data {
        Some(TokenPayload { token }) if !token.is_empty() => Ok(token),
        _ => Err("server did not issue a token".to_string()),
    }
}
