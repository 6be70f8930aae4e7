use log::{debug, info};

use super::{LoginRequest, PlatformLogin, exchange_token};
use crate::credential::CredentialStore;
use crate::error::RequestError;
use crate::storage::Storage;
use crate::transport::Transport;

/// Obtains a platform code, exchanges it for a token and stores the token.
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn login<S: Storage>(
    transport: &dyn Transport,
    platform: &dyn PlatformLogin,
    store: &CredentialStore<S>,
    path: &str,
) -> Result<String, RequestError> {
    debug!("No credential present, starting login...");

    let code = platform
        .obtain_code()
        .await
        .map_err(|e| RequestError::Login(format!("platform login failed: {:#}", e)))?;

    let token = exchange_token(transport, path, &LoginRequest { code: &code })
        .await
        .map_err(|e| RequestError::Login(format!("login exchange failed: {}", e)))?;

    store.set_token(&token);
    info!("Logged in");
    Ok(token)
}
