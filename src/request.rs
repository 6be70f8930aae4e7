//! Caller-facing request options and their merged, immutable form.

use serde::Serialize;

use crate::transport::{HttpRequest, Method};

pub const DEFAULT_LOADING: bool = false;
pub const DEFAULT_AUTH: bool = true;

/// What a caller asks for. Unset flags fall back to client defaults when merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub path: String,
    pub method: Method,
    pub data: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub loading: Option<bool>,
    pub auth: Option<bool>,
    pub retry: Option<u32>,
}

impl RequestOptions {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serializes any payload into the request data.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, serde_json::Error> {
        Ok(self.data(serde_json::to_value(body)?))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Applies defaults: `loading=false`, `auth=true`, `retry=default_retry`.
    pub fn merge(self, default_retry: u32) -> RequestConfig {
        RequestConfig {
            path: self.path,
            method: self.method,
            data: self.data,
            headers: self.headers,
            loading: self.loading.unwrap_or(DEFAULT_LOADING),
            auth: self.auth.unwrap_or(DEFAULT_AUTH),
            retry: self.retry.unwrap_or(default_retry),
        }
    }
}

/// A fully resolved logical request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub path: String,
    pub method: Method,
    pub data: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub loading: bool,
    pub auth: bool,
    /// Retries after the first attempt
    pub retry: u32,
}

impl RequestConfig {
    pub fn max_attempts(&self) -> u32 {
        self.retry.saturating_add(1)
    }

    /// Builds the transport request. A token replaces any caller-supplied
    /// `Authorization` header; without one the header is never sent.
    pub fn to_http(&self, token: Option<&str>) -> HttpRequest {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case("authorization"))
            .cloned()
            .collect();
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        HttpRequest {
            method: self.method,
            path: self.path.clone(),
            headers,
            body: self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_applies_defaults() {
        let config = RequestOptions::new(Method::Get, "/user/info").merge(3);

        assert!(!config.loading);
        assert!(config.auth);
        assert_eq!(config.retry, 3);
        assert_eq!(config.max_attempts(), 4);
    }

    #[test]
    fn test_merge_keeps_explicit_values() {
        let config = RequestOptions::new(Method::Post, "/orders")
            .loading(true)
            .auth(false)
            .retry(0)
            .merge(3);

        assert!(config.loading);
        assert!(!config.auth);
        assert_eq!(config.retry, 0);
        assert_eq!(config.max_attempts(), 1);
    }

    #[test]
    fn test_json_payload() {
        #[derive(Serialize)]
        struct Order {
            sku: &'static str,
            qty: u32,
        }

        let options = RequestOptions::new(Method::Post, "/orders")
            .json(&Order { sku: "a", qty: 2 })
            .unwrap();
        assert_eq!(options.data, Some(json!({"sku": "a", "qty": 2})));
    }

    #[test]
    fn test_to_http_with_token() {
        let config = RequestOptions::new(Method::Get, "/user/info")
            .header("X-Trace", "abc")
            .header("authorization", "Bearer forged")
            .merge(3);

        let http = config.to_http(Some("T1"));
        assert_eq!(http.path, "/user/info");
        assert_eq!(http.header("X-Trace"), Some("abc"));
        assert_eq!(http.bearer_token(), Some("T1"));
        assert_eq!(
            http.headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
                .count(),
            1
        );
    }

    #[test]
    fn test_to_http_without_token_strips_authorization() {
        let config = RequestOptions::new(Method::Post, "/auth/login")
            .header("Authorization", "Bearer stale")
            .data(json!({"code": "c"}))
            .auth(false)
            .merge(3);

        let http = config.to_http(None);
        assert_eq!(http.header("Authorization"), None);
        assert_eq!(http.body, Some(json!({"code": "c"})));
    }
}
