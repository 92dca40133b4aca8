//! Refresh token ledger entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::access_token::PrincipalKind;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refresh_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning principal.
    #[sea_orm(indexed)]
    pub principal_id: String,

    /// Namespace the token was minted in.
    pub principal_kind: PrincipalKind,

    /// The signed token value.
    #[sea_orm(unique, column_type = "Text")]
    pub token: String,

    pub issued_at: DateTimeWithTimeZone,

    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
