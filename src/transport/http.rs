//! reqwest-backed transport.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

use super::error::{TransportError, classify_error};
use super::{HttpRequest, Method, RawResponse, Transport};
use crate::config::ClientConfig;

/// Sends requests relative to a base URL with a fixed per-request timeout.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Wraps an existing reqwest Client.
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Builds a client with the configured user agent and timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self::new(client, &config.base_url, config.timeout))
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn header_map(request: &HttpRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header '{}': {}", name, e)))?;
            let mut value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header '{}': {}", name, e)))?;
            if name == reqwest::header::AUTHORIZATION {
                value.set_sensitive(true);
            }
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Flattens a JSON object into query pairs. Strings are sent verbatim,
/// other values as their JSON text; nulls are skipped.
fn query_pairs(body: &serde_json::Value) -> Result<Vec<(String, String)>, TransportError> {
    let serde_json::Value::Object(map) = body else {
        return Err(TransportError::InvalidRequest(
            "query payload must be a JSON object".to_string(),
        ));
    };

    Ok(map
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect())
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn carries_envelope(body: &serde_json::Value) -> bool {
    body.get("code").is_some_and(|c| c.is_i64() || c.is_u64())
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        let url = self.url_for(&request.path);
        debug!("{} {}...", request.method, url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .timeout(self.timeout)
            .headers(Self::header_map(request)?);

        if let Some(body) = &request.body {
            if request.method.payload_in_query() {
                builder = builder.query(&query_pairs(body)?);
            } else {
                builder = builder.json(body);
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(&e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_error(&e, self.timeout))?;

        let parsed = if text.trim().is_empty() {
            Ok(serde_json::Value::Null)
        } else {
            serde_json::from_str::<serde_json::Value>(&text)
        };

        if !status.is_success() {
            // Servers may frame an expired credential as HTTP 401 with an envelope body
            return match parsed {
                Ok(body) if carries_envelope(&body) => Ok(RawResponse {
                    status: status.as_u16(),
                    body,
                }),
                _ => Err(TransportError::Status {
                    status: status.as_u16(),
                }),
            };
        }

        let body = parsed.map_err(|e| TransportError::Decode(e.to_string()))?;
        debug!("{} {} -> {}", request.method, url, status);

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}
