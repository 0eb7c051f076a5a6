//! Service wiring: storage handles, the access guard, and token issuance.
//!
//! Built once at startup and shared behind an `Arc`; handlers reach
//! everything through this. No module-level singletons.

use std::sync::Arc;

use chrono::{Duration, Utc};

use trackle_auth::{Hs256TokenAuthority, JwtClaims, TokenAuthority};
use trackle_domain::User;
use trackle_store::Storage;

use crate::app::errors::ApiError;
use crate::guard::AccessGuard;

pub struct AppServices {
    pub storage: Storage,
    pub guard: AccessGuard,
    pub tokens: Arc<dyn TokenAuthority>,
    token_ttl: Duration,
}

impl AppServices {
    pub fn new(storage: Storage, jwt_secret: &str, token_ttl_minutes: i64) -> Self {
        let guard = AccessGuard::new(storage.clone());
        Self {
            storage,
            guard,
            tokens: Arc::new(Hs256TokenAuthority::new(jwt_secret.as_bytes())),
            token_ttl: Duration::minutes(token_ttl_minutes),
        }
    }

    /// In-memory wiring with the default token lifetime (tests, dev).
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(Storage::in_memory(), jwt_secret, 15)
    }

    /// Mint an access token for a just-authenticated user.
    pub fn issue_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.id,
            email: user.email.clone(),
            issued_at: now,
            expires_at: now + self.token_ttl,
        };
        self.tokens.issue(&claims).map_err(|err| {
            tracing::error!(error = %err, "failed to issue token");
            ApiError::Internal
        })
    }
}
