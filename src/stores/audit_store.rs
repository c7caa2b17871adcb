use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use crate::errors::internal::AuditError;
use crate::errors::InternalError;
use crate::types::db::audit_entry;
use crate::types::internal::audit::{AuditAction, AuditDetail, AuditEntry};

/// Repository for the append-only audit trail
///
/// Exposes insert and read queries only; there is no update or delete.
pub struct AuditStore {
    db: DatabaseConnection,
}

impl AuditStore {
    /// Create a new AuditStore with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append one entry
    ///
    /// # Returns
    /// The id assigned to the entry
    ///
    /// # Errors
    /// Returns `InternalError` if serialization or database insert fails
    pub async fn insert(&self, entry: AuditEntry) -> Result<i64, InternalError> {
        let detail_json = serde_json::to_string(&entry.detail)
            .map_err(|e| AuditError::LogWriteFailed(format!("Failed to serialize audit detail: {}", e)))?;

        let row = audit_entry::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            actor_user_id: Set(entry.actor_user_id),
            action: Set(entry.action.to_string()),
            target_user_id: Set(entry.target_user_id),
            detail: Set(detail_json),
            created_at: Set(entry.created_at),
        };

        let model = row
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("write_audit_entry", e))?;

        Ok(model.id)
    }

    /// Entries about one user, oldest first
    pub async fn entries_for_target(&self, user_id: &str) -> Result<Vec<AuditEntry>, InternalError> {
        let models = audit_entry::Entity::find()
            .filter(audit_entry::Column::TargetUserId.eq(user_id))
            .order_by_asc(audit_entry::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("audit_entries_for_target", e))?;

        models.into_iter().map(into_entry).collect()
    }

    /// The most recent entries, newest first
    pub async fn recent(&self, limit: u64) -> Result<Vec<AuditEntry>, InternalError> {
        let models = audit_entry::Entity::find()
            .order_by_desc(audit_entry::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("recent_audit_entries", e))?;

        models.into_iter().map(into_entry).collect()
    }
}

fn into_entry(model: audit_entry::Model) -> Result<AuditEntry, InternalError> {
    let detail: AuditDetail = serde_json::from_str(&model.detail)
        .map_err(|e| InternalError::parse("audit detail", e.to_string()))?;

    Ok(AuditEntry {
        id: Some(model.id),
        actor_user_id: model.actor_user_id,
        action: AuditAction::from(model.action),
        target_user_id: model.target_user_id,
        detail,
        created_at: model.created_at,
    })
}
