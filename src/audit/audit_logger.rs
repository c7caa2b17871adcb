use std::sync::Arc;

use crate::audit::AuditBuilder;
use crate::errors::InternalError;
use crate::stores::AuditStore;
use crate::types::internal::audit::{AuditAction, AuditDetail, AuditEntry};
use crate::types::internal::Role;

/// Records security-relevant actions
///
/// Recording never fails the operation it accompanies: a failed insert is
/// reported through `tracing::error!` and otherwise ignored. No retries.
pub struct AuditLogger {
    pub audit_store: Arc<AuditStore>,
}

impl AuditLogger {
    pub fn new(audit_store: Arc<AuditStore>) -> Self {
        Self { audit_store }
    }

    /// Create an AuditBuilder for custom entries
    ///
    /// # Arguments
    /// * `action` - Known action or a string for custom actions
    pub fn builder(&self, action: impl Into<AuditAction>) -> AuditBuilder {
        AuditBuilder::new(Arc::clone(&self.audit_store), action)
    }

    /// Append one entry
    pub async fn record(
        &self,
        actor_user_id: Option<&str>,
        action: AuditAction,
        target_user_id: Option<&str>,
        detail: AuditDetail,
    ) {
        let mut entry = AuditEntry::new(action);
        entry.actor_user_id = actor_user_id.map(str::to_string);
        entry.target_user_id = target_user_id.map(str::to_string);
        entry.detail = detail;

        persist(&self.audit_store, entry).await;
    }

    /// Entries about one user, oldest first
    pub async fn entries_for_target(&self, user_id: &str) -> Result<Vec<AuditEntry>, InternalError> {
        self.audit_store.entries_for_target(user_id).await
    }

    /// The most recent entries, newest first
    pub async fn recent(&self, limit: u64) -> Result<Vec<AuditEntry>, InternalError> {
        self.audit_store.recent(limit).await
    }

    pub async fn log_login(&self, user_id: &str, username: &str) {
        self.builder(AuditAction::Login)
            .actor(user_id)
            .target(user_id)
            .add_field("username", username)
            .write()
            .await;
    }

    /// Log a failed login
    ///
    /// There is never an actor. The target is the resolved identity, if the
    /// username matched one; otherwise only a fingerprint of the attempted
    /// username is kept, since unknown usernames are often mistyped passwords.
    pub async fn log_login_failed(&self, target_user_id: Option<&str>, attempted_username: &str, reason: &str) {
        let builder = self
            .builder(AuditAction::LoginFailed)
            .maybe_target(target_user_id)
            .add_field("reason", reason);

        let builder = match target_user_id {
            Some(_) => builder.add_field("username", attempted_username),
            None => builder.add_sensitive("attempted_username", attempted_username),
        };

        builder.write().await;
    }

    pub async fn log_logout(&self, user_id: &str) {
        self.builder(AuditAction::Logout)
            .actor(user_id)
            .target(user_id)
            .write()
            .await;
    }

    pub async fn log_password_changed(&self, user_id: &str, revoked_sessions: u64) {
        self.builder(AuditAction::PasswordChange)
            .actor(user_id)
            .target(user_id)
            .add_field("revoked_sessions", revoked_sessions)
            .write()
            .await;
    }

    pub async fn log_password_reset_by_admin(&self, admin_id: &str, target_user_id: &str, revoked_sessions: u64) {
        self.builder(AuditAction::PasswordResetByAdmin)
            .actor(admin_id)
            .target(target_user_id)
            .add_field("revoked_sessions", revoked_sessions)
            .write()
            .await;
    }

    pub async fn log_user_created(&self, actor_id: Option<&str>, user_id: &str, username: &str, role: Role) {
        self.builder(AuditAction::UserCreate)
            .maybe_actor(actor_id)
            .target(user_id)
            .add_field("username", username)
            .add_field("role", role.as_str())
            .write()
            .await;
    }

    /// An account carried over from the plaintext-password table; no actor
    pub async fn log_legacy_user_imported(&self, user_id: &str, username: &str, role: Role) {
        self.builder(AuditAction::UserCreate)
            .target(user_id)
            .add_field("username", username)
            .add_field("role", role.as_str())
            .add_field("source", "legacy_import")
            .write()
            .await;
    }

    /// # Arguments
    /// * `changed_fields` - Names of the columns that changed
    pub async fn log_user_updated(&self, admin_id: &str, user_id: &str, changed_fields: &[&str]) {
        self.builder(AuditAction::UserUpdate)
            .actor(admin_id)
            .target(user_id)
            .add_field("changed_fields", changed_fields)
            .write()
            .await;
    }

    pub async fn log_role_changed(&self, admin_id: &str, user_id: &str, from: Role, to: Role, revoked_sessions: u64) {
        self.builder(AuditAction::RoleChange)
            .actor(admin_id)
            .target(user_id)
            .add_field("from", from.as_str())
            .add_field("to", to.as_str())
            .add_field("revoked_sessions", revoked_sessions)
            .write()
            .await;
    }

    pub async fn log_account_disabled(&self, admin_id: &str, user_id: &str, revoked_sessions: u64) {
        self.builder(AuditAction::AccountDisable)
            .actor(admin_id)
            .target(user_id)
            .add_field("revoked_sessions", revoked_sessions)
            .write()
            .await;
    }

    /// # Arguments
    /// * `from_scheme` / `from_iterations` - The credential that was replaced
    pub async fn log_credential_upgraded(&self, user_id: &str, from_scheme: &str, from_iterations: i32, to_iterations: i32) {
        self.builder(AuditAction::CredentialUpgrade)
            .actor(user_id)
            .target(user_id)
            .add_field("from_scheme", from_scheme)
            .add_field("from_iterations", from_iterations)
            .add_field("to_iterations", to_iterations)
            .write()
            .await;
    }
}

/// Insert an entry, logging instead of propagating failures
pub(crate) async fn persist(store: &AuditStore, entry: AuditEntry) {
    let action = entry.action.clone();
    match store.insert(entry).await {
        Ok(id) => tracing::debug!("Audit entry {} recorded: {}", id, action),
        Err(e) => tracing::error!("Failed to record audit entry {}: {}", action, e),
    }
}
