use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::audit::audit_logger::persist;
use crate::stores::AuditStore;
use crate::types::internal::audit::{AuditAction, AuditDetail, AuditEntry};

/// Builder for audit entries
///
/// Provides a fluent API for constructing entries with type-safe field addition
/// and automatic fingerprinting of sensitive values.
///
/// # Example
/// ```no_run
/// use classroom_auth::audit::AuditLogger;
///
/// async fn example(audit: &AuditLogger, teacher_id: &str, quiz_id: &str) {
///     audit
///         .builder("QUIZ_PUBLISHED")
///         .actor(teacher_id)
///         .add_field("quiz_id", quiz_id)
///         .add_sensitive("share_link", "https://example.invalid/q/abc")
///         .write()
///         .await;
/// }
/// ```
pub struct AuditBuilder {
    action: AuditAction,
    actor_user_id: Option<String>,
    target_user_id: Option<String>,
    detail: AuditDetail,
    store: Arc<AuditStore>,
}

impl AuditBuilder {
    /// Create a new AuditBuilder for the given action
    ///
    /// # Arguments
    /// * `store` - Arc reference to the AuditStore
    /// * `action` - Known action or a string for custom actions
    pub fn new(store: Arc<AuditStore>, action: impl Into<AuditAction>) -> Self {
        Self {
            action: action.into(),
            actor_user_id: None,
            target_user_id: None,
            detail: AuditDetail::new(),
            store,
        }
    }

    /// Set the user who performed the action
    pub fn actor(mut self, user_id: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id.into());
        self
    }

    /// Set the actor only when one is known
    pub fn maybe_actor(mut self, user_id: Option<&str>) -> Self {
        self.actor_user_id = user_id.map(str::to_string);
        self
    }

    /// Set the user the action was applied to
    pub fn target(mut self, user_id: impl Into<String>) -> Self {
        self.target_user_id = Some(user_id.into());
        self
    }

    pub fn maybe_target(mut self, user_id: Option<&str>) -> Self {
        self.target_user_id = user_id.map(str::to_string);
        self
    }

    /// Add an arbitrary field to the entry's detail
    ///
    /// Values that fail to serialize are skipped.
    pub fn add_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.detail.insert(key.into(), json_value);
        }
        self
    }

    /// Add a sensitive field as a SHA-256 fingerprint
    ///
    /// The same input always produces the same `sha256:<hex>` value, so
    /// entries can be correlated without storing the original.
    pub fn add_sensitive(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(&value) {
            self.detail.insert(key.into(), json!(fingerprint(&json_value.to_string())));
        }
        self
    }

    /// Build the entry without writing it
    pub fn build(self) -> AuditEntry {
        let mut entry = AuditEntry::new(self.action);
        entry.actor_user_id = self.actor_user_id;
        entry.target_user_id = self.target_user_id;
        entry.detail = self.detail;
        entry
    }

    /// Write the entry
    ///
    /// A failed write is logged and swallowed; the caller's operation goes on.
    pub async fn write(self) {
        let store = Arc::clone(&self.store);
        persist(&store, self.build()).await;
    }
}

fn fingerprint(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}
