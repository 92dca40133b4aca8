//! Join request entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a join request.
///
/// Status moves `pending -> approved` or `pending -> rejected` and never
/// leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum RequestStatus {
    /// Awaiting an admin decision.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Admin admitted the user to the group.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Admin declined the request.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// A user's pending ask to become a member of a group.
///
/// At most one pending request exists per `(group_id, user_id)` pair,
/// enforced by a partial unique index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "join_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub group_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    pub status: RequestStatus,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
