// =====================================================================================
// CSRF STORE - ONE ACTIVE TOKEN PER SESSION
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use crate::models::AuthError;
use shared_crypto::CryptoService;
use shared_store::Store;

/// Exactly one token is kept per session: generating a new token overwrites
/// (and thereby invalidates) the previous one. A second browser tab holding
/// the older token will fail validation after a refresh elsewhere; that
/// single-token behavior is deliberate and relied upon by the logout path.
#[derive(Clone)]
pub struct CsrfStore {
    store: Store,
    crypto: Arc<CryptoService>,
    token_ttl: Duration,
}

impl CsrfStore {
    pub fn new(store: Store, crypto: Arc<CryptoService>, token_ttl: Duration) -> Self {
        Self {
            store,
            crypto,
            token_ttl,
        }
    }

    fn token_key(session_id: &str) -> String {
        format!("csrf:{}", session_id)
    }

    #[instrument(skip(self))]
    pub async fn generate_token(&self, session_id: &str) -> Result<String, AuthError> {
        let token = self
            .crypto
            .generate_csrf_token()
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        self.store
            .set_json(&Self::token_key(session_id), &token, Some(self.token_ttl))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        Ok(token)
    }

    /// Exact match against the single stored token; a missing entry fails.
    pub async fn validate_token(&self, session_id: &str, token: &str) -> bool {
        match self
            .store
            .get_json::<String>(&Self::token_key(session_id))
            .await
        {
            Ok(Some(stored)) => stored == token,
            Ok(None) => false,
            Err(e) => {
                warn!(session_id, error = %e, "csrf token lookup failed");
                false
            }
        }
    }

    /// Idempotent: revoking a session with no token is a no-op.
    pub async fn revoke_token(&self, session_id: &str) {
        if let Err(e) = self.store.delete(&Self::token_key(session_id)).await {
            warn!(session_id, error = %e, "csrf token revocation failed");
        }
    }
}
