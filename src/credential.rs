//! Bearer token holder backed by persistent storage.

use log::{debug, warn};
use std::sync::{Mutex, MutexGuard};

use crate::storage::Storage;

/// Storage key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Holds the current credential. The token is loaded lazily from storage on
/// first read and cached afterwards; an empty string means "no credential".
pub struct CredentialStore<S: Storage> {
    storage: S,
    cached: Mutex<Option<String>>,
}

impl<S: Storage> CredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            cached: Mutex::new(None),
        }
    }

    fn cache(&self) -> MutexGuard<'_, Option<String>> {
        // Only whole-value swaps happen under this lock.
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current token, or an empty string when none exists.
    pub fn get_token(&self) -> String {
        let mut cached = self.cache();
        if let Some(token) = cached.as_ref() {
            return token.clone();
        }

        let token = match self.storage.get(TOKEN_KEY) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load stored token, treating as absent: {:#}", e);
                String::new()
            }
        };
        debug!("Loaded token from storage (present: {})", !token.is_empty());
        *cached = Some(token.clone());
        token
    }

    pub fn has_token(&self) -> bool {
        !self.get_token().is_empty()
    }

    /// Replaces the current token. The in-memory value always wins, a
    /// persistence failure is only logged.
    pub fn set_token(&self, token: &str) {
        let mut cached = self.cache();
        *cached = Some(token.to_string());
        if let Err(e) = self.storage.set(TOKEN_KEY, token) {
            warn!("Failed to persist token: {:#}", e);
        }
    }

    pub fn clear_token(&self) {
        let mut cached = self.cache();
        *cached = Some(String::new());
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!("Failed to remove persisted token: {:#}", e);
        }
    }
}

/// Masks a token for display, keeping a short prefix and suffix.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
