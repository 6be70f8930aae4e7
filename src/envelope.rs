//! The server's uniform `{ code, data, message }` response wrapper.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

pub const CODE_SUCCESS: i64 = 200;
pub const CODE_EXPIRED: i64 = 401;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// How the orchestrator reacts to an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Success,
    Expired,
    Failed,
}

impl<T> ResponseEnvelope<T> {
    pub fn kind(&self) -> EnvelopeKind {
        match self.code {
            CODE_SUCCESS => EnvelopeKind::Success,
            CODE_EXPIRED => EnvelopeKind::Expired,
            _ => EnvelopeKind::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind() == EnvelopeKind::Success
    }

    /// Message to surface for a failed envelope.
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("server responded with code {}", self.code))
    }

    pub fn into_application_error(self) -> RequestError {
        RequestError::Application {
            code: self.code,
            message: self.failure_message(),
        }
    }
}

impl ResponseEnvelope<serde_json::Value> {
    /// Parses a raw response body. Anything without an integer `code` is not an envelope.
    pub fn from_body(body: serde_json::Value) -> Result<Self, RequestError> {
        serde_json::from_value(body).map_err(|e| RequestError::Decode(format!("not an envelope: {}", e)))
    }

    /// Converts the payload into the caller's type. A `null` payload becomes `None`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ResponseEnvelope<T>, RequestError> {
        let data = match self.data {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value(value).map_err(|e| RequestError::Decode(e.to_string()))?,
            ),
        };
        Ok(ResponseEnvelope {
            code: self.code,
            data,
            message: self.message,
        })
    }
}
