//! Group entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A capacity-bounded group owned by an administrator.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Group name. Not unique: two admins may each run a group with the
    /// same name; the join flow addresses groups by id.
    pub name: String,

    /// Upper bound on the member set, enforced at approval time only.
    pub max_users: i32,

    /// Owning administrator.
    #[sea_orm(indexed)]
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin::Entity",
        from = "Column::CreatedBy",
        to = "super::admin::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,
    #[sea_orm(has_many = "super::join_request::Entity")]
    JoinRequests,
    #[sea_orm(has_many = "super::group_notification::Entity")]
    Notifications,
}

impl Related<super::admin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::join_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JoinRequests.def()
    }
}

impl Related<super::group_notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
