//! Token ledger repository.
//!
//! The ledger holds every currently-issued access and refresh token, keyed
//! by `(principal_id, principal_kind)`. Verification consults it so that
//! deleting a row is a real revocation; lookups ignore rows whose
//! `expires_at` has passed.

use std::sync::Arc;

use chrono::Utc;
use cohort_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::entities::access_token::PrincipalKind;
use crate::entities::{AccessToken, RefreshToken, access_token, refresh_token};

/// Repository for the access/refresh token ledger.
#[derive(Clone)]
pub struct TokenRepository {
    db: Arc<DatabaseConnection>,
}

impl TokenRepository {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persist a freshly minted access token.
    pub async fn insert_access(
        &self,
        model: access_token::ActiveModel,
    ) -> AppResult<access_token::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a freshly minted refresh token.
    pub async fn insert_refresh(
        &self,
        model: refresh_token::ActiveModel,
    ) -> AppResult<refresh_token::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a live access token row, scoped to a principal kind.
    ///
    /// Expired rows are treated as absent: a token past `expires_at` is as
    /// revoked as a deleted one.
    pub async fn find_live_access(
        &self,
        token: &str,
        kind: PrincipalKind,
    ) -> AppResult<Option<access_token::Model>> {
        AccessToken::find()
            .filter(access_token::Column::Token.eq(token))
            .filter(access_token::Column::PrincipalKind.eq(kind))
            .filter(access_token::Column::ExpiresAt.gt(Utc::now()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a live refresh token row, scoped to a principal kind.
    pub async fn find_live_refresh(
        &self,
        token: &str,
        kind: PrincipalKind,
    ) -> AppResult<Option<refresh_token::Model>> {
        RefreshToken::find()
            .filter(refresh_token::Column::Token.eq(token))
            .filter(refresh_token::Column::PrincipalKind.eq(kind))
            .filter(refresh_token::Column::ExpiresAt.gt(Utc::now()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete one access token row by value. Deleting nothing is not an
    /// error; logout is idempotent.
    pub async fn delete_access(
        &self,
        principal_id: &str,
        kind: PrincipalKind,
        token: &str,
    ) -> AppResult<u64> {
        let result = AccessToken::delete_many()
            .filter(access_token::Column::PrincipalId.eq(principal_id))
            .filter(access_token::Column::PrincipalKind.eq(kind))
            .filter(access_token::Column::Token.eq(token))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete one refresh token row by value.
    pub async fn delete_refresh(
        &self,
        principal_id: &str,
        kind: PrincipalKind,
        token: &str,
    ) -> AppResult<u64> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::PrincipalId.eq(principal_id))
            .filter(refresh_token::Column::PrincipalKind.eq(kind))
            .filter(refresh_token::Column::Token.eq(token))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every access token row for a principal within one kind.
    ///
    /// Single-session policy: login and refresh call this before inserting
    /// the replacement row.
    pub async fn clear_access_for_principal(
        &self,
        principal_id: &str,
        kind: PrincipalKind,
    ) -> AppResult<u64> {
        let result = AccessToken::delete_many()
            .filter(access_token::Column::PrincipalId.eq(principal_id))
            .filter(access_token::Column::PrincipalKind.eq(kind))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every refresh token row for a principal within one kind.
    pub async fn clear_refresh_for_principal(
        &self,
        principal_id: &str,
        kind: PrincipalKind,
    ) -> AppResult<u64> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::PrincipalId.eq(principal_id))
            .filter(refresh_token::Column::PrincipalKind.eq(kind))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_access_row(id: &str, principal_id: &str, kind: PrincipalKind) -> access_token::Model {
        access_token::Model {
            id: id.to_string(),
            principal_id: principal_id.to_string(),
            principal_kind: kind,
            token: format!("signed-{id}"),
            issued_at: Utc::now().into(),
            expires_at: (Utc::now() + chrono::Duration::days(1)).into(),
        }
    }

    #[tokio::test]
    async fn test_find_live_access() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_access_row("tok1", "adm1", PrincipalKind::Admin)]])
                .into_connection(),
        );

        let repo = TokenRepository::new(db);
        let found = repo
            .find_live_access("signed-tok1", PrincipalKind::Admin)
            .await
            .unwrap();

        assert_eq!(found.unwrap().principal_id, "adm1");
    }

    #[tokio::test]
    async fn test_find_live_access_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<access_token::Model>::new()])
                .into_connection(),
        );

        let repo = TokenRepository::new(db);
        let found = repo
            .find_live_access("revoked", PrincipalKind::User)
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_access_is_idempotent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = TokenRepository::new(db);
        let removed = repo
            .delete_access("adm1", PrincipalKind::Admin, "gone")
            .await
            .unwrap();

        assert_eq!(removed, 0);
    }
}
