//! User account service.

use cohort_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use cohort_db::entities::user;
use cohort_db::repositories::UserRepository;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for registering a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 128))]
    pub first_name: String,

    #[validate(length(min = 1, max = 128))]
    pub last_name: String,

    pub phone_number: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    #[validate(length(max = 512))]
    pub address: Option<String>,
}

/// Input for updating a user's profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub last_name: Option<String>,

    pub phone_number: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    #[validate(length(max = 512))]
    pub address: Option<String>,
}

/// Service for user accounts.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a user account with a hashed password.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(super::password::hash_password(&input.password)?),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            phone_number: Set(input.phone_number),
            bio: Set(input.bio),
            address: Set(input.address),
            joined_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.user_repo.create(model).await
    }

    /// Get a user, erroring if absent.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List every user.
    pub async fn list(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.list().await
    }

    /// Update a user's profile fields.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let existing = self.user_repo.get_by_id(id).await?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(phone_number) = input.phone_number {
            active.phone_number = Set(Some(phone_number));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete a user.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.user_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("User not found: {id}")));
        }
        Ok(())
    }
}
