//! Create `notification` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::TargetId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::TargetKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(ColumnDef::new(Notification::Data).json_binary())
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notification_target")
                    .table(Notification::Table)
                    .col(Notification::TargetId)
                    .col(Notification::TargetKind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    TargetId,
    TargetKind,
    Message,
    Data,
    IsRead,
    CreatedAt,
}
