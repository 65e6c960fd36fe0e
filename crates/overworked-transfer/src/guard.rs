//! Session validation before privileged transfers
//!
//! The locally cached token is only a hint. Every privileged operation asks
//! the store to resolve it again before any file is touched. The guard owns
//! the token: every change is pushed to the store so calls carry the same
//! session the guard verifies.

use crate::error::{TransferError, TransferResult};
use overworked_core::Principal;
use overworked_storage::RemoteStore;
use std::sync::{Arc, PoisonError, RwLock};

pub struct SessionGuard {
    store: Arc<dyn RemoteStore>,
    token: RwLock<Option<String>>,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn RemoteStore>, token: Option<String>) -> Self {
        let guard = SessionGuard {
            store,
            token: RwLock::new(None),
        };
        guard.replace_token(token);
        guard
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.replace_token(Some(token.into()));
    }

    pub fn clear_token(&self) {
        self.replace_token(None);
    }

    fn replace_token(&self, token: Option<String>) {
        let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
        // Updated under the lock so the store never lags behind a later change.
        self.store.set_session_token(token.clone());
        *current = token;
    }

    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve the cached token to a principal through the store.
    ///
    /// A missing or rejected token is `NotAuthorized`. A store that cannot be
    /// reached surfaces as a storage error.
    pub async fn authorize(&self) -> TransferResult<Principal> {
        let token = self
            .current_token()
            .ok_or_else(|| TransferError::NotAuthorized("No active session.".to_string()))?;

        match self.store.verify_session(&token).await? {
            Some(principal) => {
                tracing::debug!(principal = %principal, "Session verified");
                Ok(principal)
            }
            None => {
                tracing::warn!("Session token rejected by storage service");
                Err(TransferError::NotAuthorized(
                    "Session is no longer valid.".to_string(),
                ))
            }
        }
    }
}
