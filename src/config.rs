//! Client-wide configuration.
//!
//! Defaults can be overridden from the environment (`TOKENFLOW_*`), and the
//! CLI overrides the environment.

use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::runtime::Runtime;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_REFRESH_CYCLES: u32 = 2;
pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";

pub const ENV_BASE_URL: &str = "TOKENFLOW_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "TOKENFLOW_TIMEOUT_SECS";
pub const ENV_RETRY: &str = "TOKENFLOW_RETRY";
pub const ENV_RETRY_DELAY_MS: &str = "TOKENFLOW_RETRY_DELAY_MS";
pub const ENV_STORAGE_DIR: &str = "TOKENFLOW_STORAGE_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto
    pub base_url: String,
    /// Fixed per-request timeout enforced by the transport
    pub timeout: Duration,
    /// Retry budget applied when a request does not specify one
    pub retry: u32,
    /// Pause between retry attempts
    pub retry_delay: Duration,
    /// How many expiry (401) cycles one logical request may go through
    pub max_refresh_cycles: u32,
    pub user_agent: String,
    pub login_path: String,
    pub refresh_path: String,
    /// Where persisted values (the token) live; `None` means in-memory only
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: DEFAULT_RETRY,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_refresh_cycles: DEFAULT_MAX_REFRESH_CYCLES,
            user_agent: format!("tokenflow/{}", env!("CARGO_PKG_VERSION")),
            login_path: LOGIN_PATH.to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `TOKENFLOW_*` environment variables. The storage
    /// directory falls back to `<config_dir>/tokenflow`.
    pub fn from_env<R: Runtime>(runtime: &R) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = runtime.env_var(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(secs) = parse_env::<u64, _>(runtime, ENV_TIMEOUT_SECS)? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retry) = parse_env::<u32, _>(runtime, ENV_RETRY)? {
            config.retry = retry;
        }
        if let Some(ms) = parse_env::<u64, _>(runtime, ENV_RETRY_DELAY_MS)? {
            config.retry_delay = Duration::from_millis(ms);
        }

        config.storage_dir = match runtime.env_var(ENV_STORAGE_DIR) {
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => runtime.config_dir().map(|d| d.join("tokenflow")),
        };

        debug!("Loaded client config: {:?}", config);
        Ok(config)
    }
}

fn parse_env<T, R>(runtime: &R, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    R: Runtime,
{
    match runtime.env_var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        Err(_) => Ok(None),
    }
}
