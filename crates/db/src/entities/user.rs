//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub username: String,

    /// Login email, unique within the user namespace.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,

    pub last_name: String,

    #[sea_orm(nullable)]
    pub phone_number: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    #[sea_orm(nullable)]
    pub address: Option<String>,

    pub joined_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    Memberships,

    #[sea_orm(has_many = "super::join_request::Entity")]
    JoinRequests,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::join_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JoinRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
