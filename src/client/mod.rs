//! Request orchestrator.
//!
//! A [`Client`] is built once and shared by reference. Per logical request it
//! merges defaults, makes sure a credential exists, sends through the
//! transport, interprets the envelope and drives retries and refreshes:
//!
//! ```text
//! PENDING -> [AUTHENTICATING] -> SENDING -> SUCCESS
//!                                        -> FAILED  -> SENDING (while budget left)
//!                                        -> EXPIRED -> AWAITING_REFRESH -> SENDING
//! ```

mod refresh_state;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::auth::{self, PlatformLogin};
use crate::config::ClientConfig;
use crate::credential::CredentialStore;
use crate::envelope::{EnvelopeKind, ResponseEnvelope};
use crate::error::RequestError;
use crate::loading::{LoadingGuard, LoadingIndicator, NoopIndicator};
use crate::request::{RequestConfig, RequestOptions};
use crate::storage::Storage;
use crate::transport::{Method, Transport};

use refresh_state::{RefreshCoordinator, Ticket};

/// Result of one send loop: either a successful envelope or an expired credential.
enum Outcome {
    Success(ResponseEnvelope<serde_json::Value>),
    /// The server rejected this token
    Expired { sent_token: String },
}

pub struct Client<T: Transport, S: Storage, L: PlatformLogin> {
    config: ClientConfig,
    transport: T,
    credentials: CredentialStore<S>,
    platform: L,
    loading: Box<dyn LoadingIndicator>,
    refresh: RefreshCoordinator,
}

impl<T: Transport, S: Storage, L: PlatformLogin> Client<T, S, L> {
    pub fn new(config: ClientConfig, transport: T, storage: S, platform: L) -> Self {
        Self {
            config,
            transport,
            credentials: CredentialStore::new(storage),
            platform,
            loading: Box::new(NoopIndicator),
            refresh: RefreshCoordinator::default(),
        }
    }

    pub fn with_loading_indicator(mut self, indicator: Box<dyn LoadingIndicator>) -> Self {
        self.loading = indicator;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore<S> {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether a token refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// Issues one logical request.
    ///
    /// Fails once the retry budget is spent, when login fails, when the
    /// refresh this request waited on fails, or when the credential keeps
    /// being rejected after `max_refresh_cycles` refreshes.
    #[tracing::instrument(skip(self, options), fields(method = %options.method, path = %options.path))]
    pub async fn request<D: DeserializeOwned>(
        &self,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope<D>, RequestError> {
        let config = options.merge(self.config.retry);
        let _loading = LoadingGuard::acquire(self.loading.as_ref(), config.loading);

        let mut refresh_cycles = 0;
        loop {
            match self.send_with_retry(&config).await? {
                Outcome::Success(envelope) => return envelope.decode(),
                Outcome::Expired { sent_token } => {
                    refresh_cycles += 1;
                    if refresh_cycles > self.config.max_refresh_cycles {
                        warn!(
                            "{} {}: credential rejected after {} refresh cycle(s)",
                            config.method, config.path, self.config.max_refresh_cycles
                        );
                        return Err(RequestError::Unauthorized(self.config.max_refresh_cycles));
                    }
                    self.await_refresh(&sent_token).await?;
                    debug!("{} {}: resubmitting after refresh", config.method, config.path);
                }
            }
        }
    }

    pub async fn get<D: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ResponseEnvelope<D>, RequestError> {
        self.request(RequestOptions::new(Method::Get, path)).await
    }

    pub async fn post<D: DeserializeOwned>(
        &self,
        path: &str,
        data: serde_json::Value,
    ) -> Result<ResponseEnvelope<D>, RequestError> {
        self.request(RequestOptions::new(Method::Post, path).data(data))
            .await
    }

    pub async fn put<D: DeserializeOwned>(
        &self,
        path: &str,
        data: serde_json::Value,
    ) -> Result<ResponseEnvelope<D>, RequestError> {
        self.request(RequestOptions::new(Method::Put, path).data(data))
            .await
    }

    pub async fn delete<D: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ResponseEnvelope<D>, RequestError> {
        self.request(RequestOptions::new(Method::Delete, path)).await
    }

    /// Runs the login flow unconditionally and stores the new token.
    pub async fn login(&self) -> Result<String, RequestError> {
        auth::login(
            &self.transport,
            &self.platform,
            &self.credentials,
            &self.config.login_path,
        )
        .await
    }

    /// Current token, logging in first when there is none.
    async fn ensure_token(&self) -> Result<String, RequestError> {
        let token = self.credentials.get_token();
        if !token.is_empty() {
            return Ok(token);
        }
        self.login().await
    }

    /// Sends until success, expiry, a non-retryable error, or an exhausted budget.
    async fn send_with_retry(&self, config: &RequestConfig) -> Result<Outcome, RequestError> {
        let max_attempts = config.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let token = if config.auth {
                Some(self.ensure_token().await?)
            } else {
                None
            };
            let request = config.to_http(token.as_deref());

            let failure = match self.transport.send(&request).await {
                Ok(response) => {
                    let envelope = ResponseEnvelope::from_body(response.body)?;
                    match (envelope.kind(), token) {
                        (EnvelopeKind::Success, _) => return Ok(Outcome::Success(envelope)),
                        (EnvelopeKind::Expired, Some(sent_token)) => {
                            debug!("{} {}: credential expired", config.method, config.path);
                            return Ok(Outcome::Expired { sent_token });
                        }
                        // 401 on an unauthenticated call is an ordinary failure
                        _ => envelope.into_application_error(),
                    }
                }
                Err(e) => RequestError::Transport(e),
            };

            if attempt >= max_attempts {
                warn!(
                    "{} {}: giving up after {} attempt(s): {}",
                    config.method, config.path, attempt, failure
                );
                return Err(failure);
            }

            warn!(
                "{} {}: attempt {}/{} failed ({}), retrying in {}ms...",
                config.method,
                config.path,
                attempt,
                max_attempts,
                failure,
                self.config.retry_delay.as_millis()
            );
            if !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }
    }

    /// Waits until a credential newer than `sent_token` is available, running
    /// the refresh itself if no other request is.
    async fn await_refresh(&self, sent_token: &str) -> Result<(), RequestError> {
        let ticket = self
            .refresh
            .begin(|| self.credentials.get_token() != sent_token);

        match ticket {
            Ticket::Stale => {
                debug!("Credential already replaced, skipping refresh");
                Ok(())
            }
            Ticket::Follower(rx) => rx
                .await
                .unwrap_or_else(|_| Err(RequestError::Refresh("refresh was abandoned".to_string()))),
            Ticket::Leader(lease) => {
                let outcome = auth::refresh(
                    &self.transport,
                    &self.credentials,
                    &self.config.refresh_path,
                )
                .await
                .map(|_| ());
                lease.settle(outcome.clone());
                outcome
            }
        }
    }
}
