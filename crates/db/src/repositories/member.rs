//! Member repository.

use std::sync::Arc;

use cohort_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Deserialize;

use crate::entities::{Member, member};

/// Paged member search parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSearch {
    /// Page number, 1-based.
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Term matched case-insensitively against name and email.
    #[serde(default)]
    pub term: String,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// One page of member search results.
#[derive(Debug)]
pub struct MemberPage {
    pub total_count: u64,
    pub page: u64,
    pub limit: u64,
    pub members: Vec<member::Model>,
}

/// Repository for member accounts.
#[derive(Clone)]
pub struct MemberRepository {
    db: Arc<DatabaseConnection>,
}

impl MemberRepository {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find member by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<member::Model>> {
        Member::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get member by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<member::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member not found: {id}")))
    }

    /// Find member by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<member::Model>> {
        Member::find()
            .filter(member::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all members, newest first.
    pub async fn list(&self) -> AppResult<Vec<member::Model>> {
        Member::find()
            .order_by(member::Column::JoinedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all members.
    pub async fn count(&self) -> AppResult<u64> {
        Member::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new member.
    pub async fn create(&self, model: member::ActiveModel) -> AppResult<member::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a member.
    pub async fn update(&self, model: member::ActiveModel) -> AppResult<member::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a member. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Member::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Paged search over name and email.
    ///
    /// The count and the page are fetched concurrently and joined before
    /// responding.
    pub async fn search(&self, search: &MemberSearch) -> AppResult<MemberPage> {
        let page = search.page.max(1);
        let limit = search.limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut filter = Condition::all();
        if !search.term.trim().is_empty() {
            let term = search.term.trim();
            filter = filter.add(
                Condition::any()
                    .add(member::Column::Name.contains(term))
                    .add(member::Column::Email.contains(term)),
            );
        }

        let count_query = Member::find().filter(filter.clone()).count(self.db.as_ref());
        let page_query = Member::find()
            .filter(filter)
            .order_by(member::Column::JoinedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref());

        let (total_count, members) = tokio::try_join!(count_query, page_query)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(MemberPage {
            total_count,
            page,
            limit,
            members,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_member(id: &str, name: &str) -> member::Model {
        member::Model {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            password_hash: "$argon2id$stub".to_string(),
            address: "1 Main St".to_string(),
            joined_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_member("mem1", "Ada")]])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let found = repo.find_by_id("mem1").await.unwrap();

        assert_eq!(found.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<member::Model>::new()])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let err = repo.get_by_id("missing").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_reports_affected_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        assert!(repo.delete("mem1").await.unwrap());
        assert!(!repo.delete("mem1").await.unwrap());
    }
}
