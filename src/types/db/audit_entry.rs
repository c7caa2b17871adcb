use sea_orm::entity::prelude::*;

/// SeaORM entity for the append-only audit_entries table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub actor_user_id: Option<String>,
    pub action: String,
    pub target_user_id: Option<String>,
    /// JSON object, serialized
    pub detail: String,
    /// RFC 3339
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
