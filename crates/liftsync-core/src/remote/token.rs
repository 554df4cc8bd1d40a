//! Bearer token access.
//!
//! Acquiring a token (the OAuth consent flow) happens elsewhere; this module
//! only hands out the last one received and forgets it once the remote store
//! rejects it.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::KvStore;

const TOKEN_KEY: &str = "auth:token";

/// Source of the bearer token sent with every remote call.
pub trait TokenProvider: Send + Sync {
    /// Current token, or `None` when the user must authenticate again.
    fn token(&self) -> Option<String>;

    /// Forget the current token after the remote store rejected it.
    fn invalidate(&self);
}

/// Keeps the last-known token in the durable local store so it survives
/// restarts.
#[derive(Clone)]
pub struct StoredTokenProvider {
    store: Arc<dyn KvStore>,
}

impl StoredTokenProvider {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Record a freshly acquired token.
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token.trim())?;
        info!("stored new access token");
        Ok(())
    }
}

impl TokenProvider for StoredTokenProvider {
    fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "could not read stored token");
                None
            }
        }
    }

    fn invalidate(&self) {
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            warn!(error = %e, "could not remove rejected token");
        } else {
            info!("access token invalidated");
        }
    }
}
