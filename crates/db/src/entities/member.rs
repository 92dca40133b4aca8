//! Member entity.
//!
//! Members are staff-like principals managed by administrators. They are a
//! namespace of their own: a member email may coexist with an identical
//! user or admin email.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Login email, unique within the member namespace.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub address: String,

    pub joined_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
