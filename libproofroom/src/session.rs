//! Auth token session state
//!
//! The only durable application state outside a mounted store: the bearer
//! token, kept under a well-known key in the storage adapter. Token
//! acquisition is out of scope; operators obtain one from the studio and
//! store it with `proof-login`.

use std::sync::Arc;

use crate::error::{ProofroomError, Result};
use crate::storage::StorageAdapter;

/// Storage key the token lives under.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

#[derive(Clone)]
pub struct Session {
    storage: Arc<StorageAdapter>,
}

impl Session {
    pub fn new(storage: Arc<StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Persist the token. Fails on an empty token or a storage write failure.
    pub fn store_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ProofroomError::InvalidInput(
                "token must not be empty".to_string(),
            ));
        }
        self.storage.set(AUTH_TOKEN_KEY, token)?;
        Ok(())
    }

    /// The stored token, if any. Storage read failures report as absent.
    pub fn token(&self) -> Option<String> {
        self.storage.get(AUTH_TOKEN_KEY)
    }

    /// Drop the stored token, best-effort.
    pub fn clear_token(&self) {
        self.storage.remove(AUTH_TOKEN_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}
