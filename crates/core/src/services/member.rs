//! Member management service.

use cohort_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use cohort_db::entities::member;
use cohort_db::repositories::{MemberPage, MemberRepository, MemberSearch};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating a member.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 512))]
    pub address: String,
}

/// Input for updating a member.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 512))]
    pub address: Option<String>,
}

/// Service for admin-managed member accounts.
#[derive(Clone)]
pub struct MemberService {
    member_repo: MemberRepository,
    id_gen: IdGenerator,
}

impl MemberService {
    /// Create a new member service.
    #[must_use]
    pub const fn new(member_repo: MemberRepository) -> Self {
        Self {
            member_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a member account with a hashed password.
    pub async fn create(&self, input: CreateMemberInput) -> AppResult<member::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.member_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let model = member::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(super::password::hash_password(&input.password)?),
            address: Set(input.address),
            joined_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.member_repo.create(model).await
    }

    /// Get a member, erroring if absent.
    pub async fn get(&self, id: &str) -> AppResult<member::Model> {
        self.member_repo.get_by_id(id).await
    }

    /// List every member.
    pub async fn list(&self) -> AppResult<Vec<member::Model>> {
        self.member_repo.list().await
    }

    /// Count every member.
    pub async fn count(&self) -> AppResult<u64> {
        self.member_repo.count().await
    }

    /// Update a member's profile fields.
    pub async fn update(&self, id: &str, input: UpdateMemberInput) -> AppResult<member::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let existing = self.member_repo.get_by_id(id).await?;

        let mut active: member::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.member_repo.update(active).await
    }

    /// Delete a member.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.member_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Member not found: {id}")));
        }
        Ok(())
    }

    /// Paged search over member names and emails.
    pub async fn search(&self, search: &MemberSearch) -> AppResult<MemberPage> {
        self.member_repo.search(search).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service_over(db: Arc<sea_orm::DatabaseConnection>) -> MemberService {
        MemberService::new(MemberRepository::new(db))
    }

    fn test_member(id: &str, email: &str) -> member::Model {
        member::Model {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            address: "1 Main St".to_string(),
            joined_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_taken_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_member("mem1", "ada@example.com")]])
                .into_connection(),
        );
        let service = service_over(db);

        let err = service
            .create(CreateMemberInput {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "password123".to_string(),
                address: "1 Main St".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_short_password() {
        let service = service_over(cohort_db::test_utils::mock_db());

        let err = service
            .create(CreateMemberInput {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "short".to_string(),
                address: "1 Main St".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
