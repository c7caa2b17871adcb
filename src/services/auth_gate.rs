use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::errors::AuthError;
use crate::stores::SessionStore;
use crate::types::internal::{Role, UserIdentity};

/// Resolves session tokens into identities and checks role sets
///
/// Each request walks Unauthenticated -> Authenticated -> Authorized or
/// Forbidden. Absent, expired, revoked and disabled-account tokens are all
/// reported as `NotLoggedIn`.
pub struct AuthGate {
    db: DatabaseConnection,
    sessions: Arc<SessionStore>,
}

impl AuthGate {
    pub fn new(db: DatabaseConnection, sessions: Arc<SessionStore>) -> Self {
        Self { db, sessions }
    }

    /// Resolve a token to its identity
    pub async fn authenticate(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NotLoggedIn);
        }

        self.sessions
            .resolve(&self.db, token)
            .await?
            .ok_or(AuthError::NotLoggedIn)
    }

    /// Flat set membership; no role implies another
    pub fn authorize(&self, identity: &UserIdentity, roles: &[Role]) -> Result<(), AuthError> {
        if roles.contains(&identity.role) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %identity.id,
                "Role {} not in {:?}",
                identity.role,
                roles
            );
            Err(AuthError::Forbidden)
        }
    }

    pub async fn require_login(&self, token: &str) -> Result<UserIdentity, AuthError> {
        self.authenticate(token).await
    }

    /// Authenticate, then authorize; a NotLoggedIn caller never sees Forbidden
    pub async fn require_role(&self, token: &str, roles: &[Role]) -> Result<UserIdentity, AuthError> {
        let identity = self.authenticate(token).await?;
        self.authorize(&identity, roles)?;
        Ok(identity)
    }
}
