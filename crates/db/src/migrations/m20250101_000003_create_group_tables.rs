//! Create `group`, `group_member`, `join_request`, and `group_notification`
//! tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Group::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Group::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Group::MaxUsers).integer().not_null())
                    .col(ColumnDef::new(Group::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Group::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Group::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_owner")
                            .from(Group::Table, Group::CreatedBy)
                            .to(Admin::Table, Admin::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_created_by")
                    .table(Group::Table)
                    .col(Group::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMember::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupMember::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupMember::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupMember::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_member_group")
                            .from(GroupMember::Table, GroupMember::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_member_user")
                            .from(GroupMember::Table, GroupMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership row per (group, user)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_unique")
                    .table(GroupMember::Table)
                    .col(GroupMember::GroupId)
                    .col(GroupMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_user_id")
                    .table(GroupMember::Table)
                    .col(GroupMember::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JoinRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JoinRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JoinRequest::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JoinRequest::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JoinRequest::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(JoinRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(JoinRequest::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_request_group")
                            .from(JoinRequest::Table, JoinRequest::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_request_user")
                            .from(JoinRequest::Table, JoinRequest::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_join_request_group_id")
                    .table(JoinRequest::Table)
                    .col(JoinRequest::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_join_request_user_id")
                    .table(JoinRequest::Table)
                    .col(JoinRequest::UserId)
                    .to_owned(),
            )
            .await?;

        // At most one pending request per (group, user). Partial indexes are
        // not expressible through the schema builder, so this goes out raw.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_join_request_pending_unique \
                 ON join_request (group_id, user_id) WHERE status = 'pending'",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupNotification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupNotification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupNotification::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupNotification::Message).text().not_null())
                    .col(
                        ColumnDef::new(GroupNotification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_notification_group")
                            .from(GroupNotification::Table, GroupNotification::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_notification_group_id")
                    .table(GroupNotification::Table)
                    .col(GroupNotification::GroupId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupNotification::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JoinRequest::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Group::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
    Name,
    MaxUsers,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupMember {
    Table,
    Id,
    GroupId,
    UserId,
    JoinedAt,
}

#[derive(Iden)]
enum JoinRequest {
    Table,
    Id,
    GroupId,
    UserId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupNotification {
    Table,
    Id,
    GroupId,
    Message,
    CreatedAt,
}

#[derive(Iden)]
enum Admin {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
