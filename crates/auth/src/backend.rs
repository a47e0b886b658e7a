//! Concrete authentication backend
//!
//! Session management lives in Supabase; this backend only verifies the
//! access token it issued and turns the claims into an `AuthContext`.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;

/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    config: Arc<AuthConfig>,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a bearer token and resolve the viewing user
    pub fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;
        let ctx = AuthContext::from_claims(&claims)?;
        tracing::debug!(user_id = %ctx.user_id, user_type = %ctx.user_type, "Authenticated viewer");
        Ok(ctx)
    }
}
