use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::errors::internal::UserError;
use crate::errors::InternalError;
use crate::types::db::user;
use crate::types::internal::{Credential, Role, UserIdentity};

/// Fields for a new user row
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub credential: Credential,
}

/// Profile changes; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.role.is_none() && self.is_active.is_none()
    }
}

/// Data access for user rows
///
/// Stateless; every method takes the connection (or transaction) to run on.
#[derive(Debug, Default, Clone)]
pub struct UserStore;

impl UserStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_username<C: ConnectionTrait>(
        &self,
        conn: &C,
        username: &str,
    ) -> Result<Option<UserIdentity>, InternalError> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_username", e))?;

        model.map(UserIdentity::try_from).transpose()
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> Result<Option<UserIdentity>, InternalError> {
        let model = user::Entity::find_by_id(user_id.to_string())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))?;

        model.map(UserIdentity::try_from).transpose()
    }

    /// Insert a user with a fresh UUID
    ///
    /// # Errors
    /// * `UserError::DuplicateUsername` - Username already taken
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        record: NewUserRecord,
    ) -> Result<UserIdentity, InternalError> {
        let now = Utc::now().timestamp();
        let username = record.username.clone();

        let row = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(record.username),
            display_name: Set(record.display_name),
            role: Set(record.role.as_str().to_string()),
            password_scheme: Set(record.credential.scheme),
            password_hash: Set(record.credential.hash),
            password_salt: Set(record.credential.salt),
            password_iterations: Set(record.credential.iterations),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = row.insert(conn).await.map_err(|e| {
            let err = InternalError::database("create_user", e);
            if err.is_unique_violation() {
                UserError::DuplicateUsername(username.clone()).into()
            } else {
                err
            }
        })?;

        tracing::debug!(user_id = %model.id, "User created: {}", model.username);
        UserIdentity::try_from(model)
    }

    /// Apply profile changes and bump `updated_at`
    ///
    /// # Errors
    /// * `UserError::NotFound` - No user with that id
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        changes: &UserChanges,
    ) -> Result<UserIdentity, InternalError> {
        let model = user::Entity::find_by_id(user_id.to_string())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_for_update", e))?
            .ok_or_else(|| UserError::NotFound(user_id.to_string()))?;

        if changes.is_empty() {
            return UserIdentity::try_from(model);
        }

        let mut row: user::ActiveModel = model.into();
        if let Some(display_name) = &changes.display_name {
            row.display_name = Set(display_name.clone());
        }
        if let Some(role) = changes.role {
            row.role = Set(role.as_str().to_string());
        }
        if let Some(is_active) = changes.is_active {
            row.is_active = Set(is_active);
        }
        row.updated_at = Set(Utc::now().timestamp());

        let model = row
            .update(conn)
            .await
            .map_err(|e| InternalError::database("update_user", e))?;

        tracing::debug!(user_id = %model.id, "User updated");
        UserIdentity::try_from(model)
    }

    /// All users, oldest first
    pub async fn list<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<UserIdentity>, InternalError> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Username)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_users", e))?;

        models.into_iter().map(UserIdentity::try_from).collect()
    }
}
