use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::audit::AuditLogger;
use crate::config::AuthSettings;
use crate::errors::{AuthError, InternalError};
use crate::services::auth_gate::AuthGate;
use crate::services::password_policy::MAX_PASSWORD_LENGTH;
use crate::stores::{CredentialStore, NewUserRecord, SessionStore, UserChanges, UserStore};
use crate::types::internal::{Credential, CredentialScheme, Role, UserIdentity};

const MAX_USERNAME_LENGTH: usize = 80;
const MAX_DISPLAY_NAME_LENGTH: usize = 80;

/// Input for creating an account
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    /// Defaults to the username
    pub display_name: Option<String>,
    pub role: Role,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An account row from the plaintext-password table
#[derive(Clone)]
pub struct LegacyUser {
    pub username: String,
    /// Defaults to the username
    pub display_name: Option<String>,
    pub role: Role,
    pub password_text: String,
}

impl fmt::Debug for LegacyUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyUser")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("password_text", &"<redacted>")
            .finish()
    }
}

/// Login, logout, password management and user administration
///
/// Store errors come back as `InternalError` and are translated into the
/// `AuthError` taxonomy here.
pub struct AuthService {
    db: DatabaseConnection,
    users: UserStore,
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionStore>,
    gate: Arc<AuthGate>,
    audit: Arc<AuditLogger>,
    session_ttl_seconds: i64,
    failed_login_delay: Duration,
    decoy: Credential,
}

impl AuthService {
    /// Create the service
    ///
    /// Derives the decoy credential used for unknown usernames, so this costs
    /// one key derivation.
    pub async fn new(
        db: DatabaseConnection,
        settings: &AuthSettings,
        credentials: Arc<CredentialStore>,
        sessions: Arc<SessionStore>,
        gate: Arc<AuthGate>,
        audit: Arc<AuditLogger>,
    ) -> Result<Self, InternalError> {
        let decoy = credentials.decoy_credential().await?;

        Ok(Self {
            db,
            users: UserStore::new(),
            credentials,
            sessions,
            gate,
            audit,
            session_ttl_seconds: settings.session_ttl_seconds(),
            failed_login_delay: settings.failed_login_delay(),
            decoy,
        })
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Verify a username and password and open a session
    ///
    /// Unknown usernames and wrong passwords both cost one key derivation
    /// plus the configured delay and both yield `InvalidCredentials`.
    /// `AccountDisabled` is only reported once the password was correct.
    ///
    /// # Returns
    /// The identity and the new session token
    pub async fn login(&self, username: &str, password: &str) -> Result<(UserIdentity, String), AuthError> {
        let user = match self.users.find_by_username(&self.db, username).await? {
            Some(user) => user,
            None => {
                // Result ignored: this only equalizes the work done
                let _ = self.credentials.verify(password, &self.decoy).await;
                return Err(self.reject_login(None, username, "unknown_username").await);
            }
        };

        let verified = self
            .credentials
            .verify(password, &user.credential)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, "Cannot verify stored credential");
                AuthError::from(e)
            })?;

        if !verified {
            return Err(self.reject_login(Some(&user.id), username, "wrong_password").await);
        }

        if !user.is_active {
            self.audit
                .log_login_failed(Some(&user.id), username, "account_disabled")
                .await;
            return Err(AuthError::AccountDisabled);
        }

        let user = if self.credentials.needs_rotation(&user.credential) {
            self.upgrade_credential(user, password).await?
        } else {
            user
        };

        let token = self
            .sessions
            .issue(&self.db, &user.id, self.session_ttl_seconds)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        self.audit.log_login(&user.id, &user.username).await;

        Ok((user, token))
    }

    /// Revoke the session behind `token`; idempotent
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if let Some(user_id) = self.sessions.revoke(&self.db, token).await? {
            tracing::info!(user_id = %user_id, "User logged out");
            self.audit.log_logout(&user_id).await;
        }
        Ok(())
    }

    /// Change the caller's own password
    ///
    /// Every other session of the user is revoked; the session making the
    /// request stays valid.
    pub async fn change_password(&self, token: &str, old_password: &str, new_password: &str) -> Result<(), AuthError> {
        let identity = self.gate.require_login(token).await?;

        if !self.credentials.verify(old_password, &identity.credential).await? {
            tokio::time::sleep(self.failed_login_delay).await;
            return Err(AuthError::InvalidCredentials);
        }

        let credential = self
            .credentials
            .create_credential(new_password, Some(&identity.username))
            .await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InternalError::database("begin_change_password", e))?;
        self.credentials
            .replace_credential(&txn, &identity.id, &credential)
            .await?;
        let revoked = self
            .sessions
            .revoke_all_except(&txn, &identity.id, token)
            .await?;
        txn.commit()
            .await
            .map_err(|e| InternalError::database("commit_change_password", e))?;

        tracing::info!(user_id = %identity.id, "Password changed, {} other session(s) revoked", revoked);
        self.audit.log_password_changed(&identity.id, revoked).await;

        Ok(())
    }

    /// Set another user's password; admin only
    ///
    /// All of the target's sessions are revoked.
    pub async fn admin_reset_password(
        &self,
        admin_token: &str,
        target_user_id: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let admin = self.gate.require_role(admin_token, &[Role::Admin]).await?;

        let target = self
            .users
            .find_by_id(&self.db, target_user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let credential = self
            .credentials
            .create_credential(new_password, Some(&target.username))
            .await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InternalError::database("begin_admin_reset", e))?;
        self.credentials
            .replace_credential(&txn, &target.id, &credential)
            .await?;
        let revoked = self.sessions.revoke_all(&txn, &target.id).await?;
        txn.commit()
            .await
            .map_err(|e| InternalError::database("commit_admin_reset", e))?;

        tracing::info!(
            admin_id = %admin.id,
            user_id = %target.id,
            "Password reset by admin, {} session(s) revoked",
            revoked
        );
        self.audit
            .log_password_reset_by_admin(&admin.id, &target.id, revoked)
            .await;

        Ok(())
    }

    /// Create an account; admin only
    pub async fn create_user(&self, admin_token: &str, new_user: NewUser) -> Result<UserIdentity, AuthError> {
        let admin = self.gate.require_role(admin_token, &[Role::Admin]).await?;
        self.provision_user(Some(&admin.id), new_user).await
    }

    /// Create an account without an authenticated caller
    ///
    /// For operator tooling (the `create-user` command) that runs with direct
    /// database access. The audit entry has no actor.
    pub async fn provision_user(&self, actor_id: Option<&str>, new_user: NewUser) -> Result<UserIdentity, AuthError> {
        validate_username(&new_user.username)?;
        let display_name = new_user
            .display_name
            .unwrap_or_else(|| new_user.username.clone());
        validate_display_name(&display_name)?;

        let credential = self
            .credentials
            .create_credential(&new_user.password, Some(&new_user.username))
            .await?;

        let identity = self
            .users
            .create(
                &self.db,
                NewUserRecord {
                    username: new_user.username,
                    display_name,
                    role: new_user.role,
                    credential,
                },
            )
            .await?;

        tracing::info!(user_id = %identity.id, "User '{}' created with role {}", identity.username, identity.role);
        self.audit
            .log_user_created(actor_id, &identity.id, &identity.username, identity.role)
            .await;

        Ok(identity)
    }

    /// Carry over an account whose password is only known in plaintext
    ///
    /// The password is stored under the legacy scheme without a policy check,
    /// so the user can still sign in with it; the first successful login
    /// re-hashes it. Operator tooling only.
    pub async fn import_legacy_user(&self, legacy: LegacyUser) -> Result<UserIdentity, AuthError> {
        validate_username(&legacy.username)?;
        let display_name = legacy
            .display_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| legacy.username.clone());
        validate_display_name(&display_name)?;

        let length = legacy.password_text.chars().count();
        if length == 0 || length > MAX_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "password_text must be 1-{} characters",
                MAX_PASSWORD_LENGTH
            )));
        }

        let identity = self
            .users
            .create(
                &self.db,
                NewUserRecord {
                    username: legacy.username,
                    display_name,
                    role: legacy.role,
                    credential: CredentialStore::legacy_plaintext(&legacy.password_text),
                },
            )
            .await?;

        tracing::warn!(user_id = %identity.id, "Imported '{}' with a legacy plaintext credential", identity.username);
        self.audit
            .log_legacy_user_imported(&identity.id, &identity.username, identity.role)
            .await;

        Ok(identity)
    }

    /// Change display name, role or active flag; admin only
    ///
    /// A role change or a deactivation revokes all of the user's sessions.
    pub async fn update_user(
        &self,
        admin_token: &str,
        user_id: &str,
        changes: UserChanges,
    ) -> Result<UserIdentity, AuthError> {
        let admin = self.gate.require_role(admin_token, &[Role::Admin]).await?;

        if let Some(display_name) = &changes.display_name {
            validate_display_name(display_name)?;
        }

        let before = self
            .users
            .find_by_id(&self.db, user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let after = self.users.update(&self.db, user_id, &changes).await?;

        let role_changed = before.role != after.role;
        let disabled = before.is_active && !after.is_active;

        let revoked = if role_changed || disabled {
            self.sessions.revoke_all(&self.db, user_id).await?
        } else {
            0
        };

        let mut changed_fields = Vec::new();
        if before.display_name != after.display_name {
            changed_fields.push("display_name");
        }
        if role_changed {
            changed_fields.push("role");
        }
        if before.is_active != after.is_active {
            changed_fields.push("is_active");
        }

        self.audit
            .log_user_updated(&admin.id, user_id, &changed_fields)
            .await;
        if role_changed {
            self.audit
                .log_role_changed(&admin.id, user_id, before.role, after.role, revoked)
                .await;
        }
        if disabled {
            tracing::info!(user_id = %user_id, "Account disabled, {} session(s) revoked", revoked);
            self.audit
                .log_account_disabled(&admin.id, user_id, revoked)
                .await;
        }

        Ok(after)
    }

    /// All accounts, oldest first; admin only
    pub async fn list_users(&self, admin_token: &str) -> Result<Vec<UserIdentity>, AuthError> {
        self.gate.require_role(admin_token, &[Role::Admin]).await?;
        Ok(self.users.list(&self.db).await?)
    }

    /// The identity behind a session
    pub async fn whoami(&self, token: &str) -> Result<UserIdentity, AuthError> {
        self.gate.require_login(token).await
    }

    /// Remove sessions whose expiry has passed
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        Ok(self.sessions.purge_expired(&self.db).await?)
    }

    async fn reject_login(&self, target_user_id: Option<&str>, username: &str, reason: &str) -> AuthError {
        tokio::time::sleep(self.failed_login_delay).await;
        tracing::debug!("Login rejected: {}", reason);
        self.audit
            .log_login_failed(target_user_id, username, reason)
            .await;
        AuthError::InvalidCredentials
    }

    /// Re-hash a verified password under the current scheme and iteration count
    async fn upgrade_credential(&self, user: UserIdentity, password: &str) -> Result<UserIdentity, AuthError> {
        let old = user.credential.clone();
        let credential = self.credentials.rotate(password, &old).await?;
        self.credentials
            .replace_credential(&self.db, &user.id, &credential)
            .await?;

        if CredentialScheme::parse(&old.scheme) == Some(CredentialScheme::LegacyPlaintext) {
            tracing::warn!(user_id = %user.id, "Legacy plaintext credential upgraded on login");
        } else {
            tracing::info!(
                user_id = %user.id,
                "Credential re-hashed from {} to {} iterations",
                old.iterations,
                credential.iterations
            );
        }
        self.audit
            .log_credential_upgraded(&user.id, &old.scheme, old.iterations, credential.iterations)
            .await;

        Ok(UserIdentity { credential, ..user })
    }
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    let length = username.chars().count();
    if length == 0 || length > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "username must be 1-{} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if username.trim() != username {
        return Err(AuthError::InvalidInput(
            "username must not start or end with whitespace".to_string(),
        ));
    }
    if username.chars().any(char::is_control) {
        return Err(AuthError::InvalidInput(
            "username must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_display_name(display_name: &str) -> Result<(), AuthError> {
    if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "display name must be at most {} characters",
            MAX_DISPLAY_NAME_LENGTH
        )));
    }
    if display_name.chars().any(char::is_control) {
        return Err(AuthError::InvalidInput(
            "display name must not contain control characters".to_string(),
        ));
    }
    Ok(())
}
