//! Access token ledger entity.
//!
//! Every issued access token is persisted here so that logout and rotation
//! actually revoke access: a structurally valid token with no ledger row is
//! rejected at verification time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The three disjoint principal namespaces.
///
/// A token minted for one kind never verifies against another, even when
/// the same email exists in both namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "member")]
    Member,
    #[sea_orm(string_value = "user")]
    User,
}

impl PrincipalKind {
    /// Stable string form, used in token claims and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_token")]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(PrincipalKind::Admin.as_str(), "admin");
        assert_eq!(PrincipalKind::Member.as_str(), "member");
        assert_eq!(PrincipalKind::User.as_str(), "user");
        assert_eq!(PrincipalKind::User.to_string(), "user");
    }
}
