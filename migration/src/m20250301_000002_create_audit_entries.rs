use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only: nothing in the application issues UPDATE or DELETE here
        manager
            .create_table(
                Table::create()
                    .table(AuditEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditEntries::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(AuditEntries::ActorUserId).string().null())
                    .col(ColumnDef::new(AuditEntries::Action).string().not_null())
                    .col(ColumnDef::new(AuditEntries::TargetUserId).string().null())
                    .col(ColumnDef::new(AuditEntries::Detail).string().not_null())
                    .col(ColumnDef::new(AuditEntries::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entries_action")
                    .table(AuditEntries::Table)
                    .col(AuditEntries::Action)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entries_target_user_id")
                    .table(AuditEntries::Table)
                    .col(AuditEntries::TargetUserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entries_created_at")
                    .table(AuditEntries::Table)
                    .col(AuditEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditEntries::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AuditEntries {
    Table,
    Id,
    ActorUserId,
    Action,
    TargetUserId,
    Detail,
    CreatedAt,
}
