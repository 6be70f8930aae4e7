//! Authenticated HTTP request layer with single-flight token refresh.
//!
//! [`Client::request`] is the entry point: it attaches the bearer credential,
//! logs in when none exists, retries failed calls within a per-request budget,
//! and funnels concurrent credential expiries through one refresh.

pub mod auth;
pub mod client;
pub mod config;
pub mod credential;
pub mod envelope;
pub mod error;
pub mod loading;
pub mod request;
pub mod runtime;
pub mod storage;
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use envelope::ResponseEnvelope;
pub use error::RequestError;
pub use request::{RequestConfig, RequestOptions};
