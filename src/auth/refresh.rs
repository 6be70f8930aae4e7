use log::{info, warn};

use super::{RefreshRequest, exchange_token};
use crate::credential::CredentialStore;
use crate::error::RequestError;
use crate::storage::Storage;
use crate::transport::Transport;

/// Exchanges the current (stale) token for a new one. On failure the stored
/// credential is cleared so the next authenticated request logs in again.
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn refresh<S: Storage>(
    transport: &dyn Transport,
    store: &CredentialStore<S>,
    path: &str,
) -> Result<String, RequestError> {
    let old_token = store.get_token();

    match exchange_token(transport, path, &RefreshRequest { old_token: &old_token }).await {
        Ok(token) => {
            store.set_token(&token);
            info!("Token refreshed");
            Ok(token)
        }
        Err(e) => {
            warn!("Token refresh failed, clearing credential: {}", e);
            store.clear_token();
            Err(RequestError::Refresh(e))
        }
    }
}
