use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use sha2::Sha256;

use crate::errors::internal::SessionError;
use crate::errors::InternalError;
use crate::types::db::{session, user};
use crate::types::internal::UserIdentity;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes per session token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Attempts at inserting a fresh token before giving up
const MAX_ISSUE_ATTEMPTS: u32 = 3;

/// Persists opaque session tokens bound to a user id with an expiry
///
/// Only `HMAC-SHA256(session_secret, token)` is stored, so rows read from a
/// leaked database cannot be replayed as tokens. Every method takes the
/// connection explicitly and can run inside a caller's transaction.
pub struct SessionStore {
    keyed_mac: HmacSha256,
}

impl SessionStore {
    pub fn new(secret: &[u8]) -> Result<Self, InternalError> {
        let keyed_mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| InternalError::crypto("session_hmac_key", e.to_string()))?;

        Ok(Self { keyed_mac })
    }

    /// Keyed hash under which a token is stored
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac = self.keyed_mac.clone();
        mac.update(token.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Create a session for a user
    ///
    /// # Arguments
    /// * `user_id` - Owner of the session
    /// * `ttl_seconds` - Lifetime; `expires_at = now + ttl_seconds`
    ///
    /// # Returns
    /// * `Ok(String)` - The plaintext token; it is not stored anywhere
    /// * `Err(InternalError)` - Database failure or repeated token collisions
    pub async fn issue<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        ttl_seconds: i64,
    ) -> Result<String, InternalError> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = generate_token();
            let now = Utc::now().timestamp();

            let row = session::ActiveModel {
                token_hash: Set(self.hash_token(&token)),
                user_id: Set(user_id.to_string()),
                created_at: Set(now),
                expires_at: Set(now.saturating_add(ttl_seconds)),
            };

            match row.insert(conn).await {
                Ok(_) => {
                    tracing::debug!(user_id = %user_id, "Session issued");
                    return Ok(token);
                }
                Err(e) => {
                    let err = InternalError::database("issue_session", e);
                    if !err.is_unique_violation() {
                        return Err(err);
                    }
                    tracing::warn!("Session token collision on attempt {}", attempt);
                }
            }
        }

        Err(SessionError::TokenCollision {
            attempts: MAX_ISSUE_ATTEMPTS,
        }
        .into())
    }

    /// Look up the identity behind a token
    ///
    /// Expired rows are deleted on sight. Unknown tokens, expired tokens and
    /// tokens of disabled accounts all yield `None`.
    pub async fn resolve<C: ConnectionTrait>(
        &self,
        conn: &C,
        token: &str,
    ) -> Result<Option<UserIdentity>, InternalError> {
        if token.is_empty() {
            return Ok(None);
        }

        let token_hash = self.hash_token(token);
        let found = session::Entity::find_by_id(token_hash.clone())
            .find_also_related(user::Entity)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("resolve_session", e))?;

        let (row, owner) = match found {
            Some(pair) => pair,
            None => return Ok(None),
        };

        if row.expires_at <= Utc::now().timestamp() {
            session::Entity::delete_by_id(token_hash)
                .exec(conn)
                .await
                .map_err(|e| InternalError::database("delete_expired_session", e))?;
            tracing::debug!(user_id = %row.user_id, "Expired session removed");
            return Ok(None);
        }

        let identity = match owner {
            Some(model) => UserIdentity::try_from(model)?,
            None => return Ok(None),
        };

        if !identity.is_active {
            tracing::debug!(user_id = %identity.id, "Session belongs to a disabled account");
            return Ok(None);
        }

        Ok(Some(identity))
    }

    /// Delete one session; idempotent
    ///
    /// # Returns
    /// The owning user id if a session existed
    pub async fn revoke<C: ConnectionTrait>(
        &self,
        conn: &C,
        token: &str,
    ) -> Result<Option<String>, InternalError> {
        if token.is_empty() {
            return Ok(None);
        }

        let token_hash = self.hash_token(token);
        let existing = session::Entity::find_by_id(token_hash.clone())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_session", e))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        session::Entity::delete_by_id(token_hash)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("revoke_session", e))?;

        tracing::debug!(user_id = %existing.user_id, "Session revoked");
        Ok(Some(existing.user_id))
    }

    /// Delete every session of a user
    pub async fn revoke_all<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("revoke_all_sessions", e))?;

        tracing::debug!(user_id = %user_id, "Revoked {} session(s)", result.rows_affected);
        Ok(result.rows_affected)
    }

    /// Delete every session of a user except the one behind `keep_token`
    pub async fn revoke_all_except<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        keep_token: &str,
    ) -> Result<u64, InternalError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::TokenHash.ne(self.hash_token(keep_token)))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("revoke_other_sessions", e))?;

        tracing::debug!(user_id = %user_id, "Revoked {} other session(s)", result.rows_affected);
        Ok(result.rows_affected)
    }

    /// Delete all sessions whose expiry has passed
    pub async fn purge_expired<C: ConnectionTrait>(&self, conn: &C) -> Result<u64, InternalError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(Utc::now().timestamp()))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("purge_expired_sessions", e))?;

        tracing::info!("Purged {} expired session(s)", result.rows_affected);
        Ok(result.rows_affected)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}
