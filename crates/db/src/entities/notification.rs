//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which kind of principal a stored notification addresses.
///
/// Admins receive no stored notifications; group broadcasts are logged on
/// the group itself (see `group_notification`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum NotificationTarget {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "member")]
    Member,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The principal receiving the notification.
    #[sea_orm(indexed)]
    pub target_id: String,

    /// Which namespace the target id belongs to.
    pub target_kind: NotificationTarget,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// Free-form payload delivered alongside the message.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub data: Option<Json>,

    /// Has this notification been read?
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
