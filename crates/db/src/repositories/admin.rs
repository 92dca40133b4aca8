//! Admin repository.

use std::sync::Arc;

use cohort_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::entities::{Admin, admin};

/// Repository for administrator accounts.
#[derive(Clone)]
pub struct AdminRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminRepository {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find admin by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<admin::Model>> {
        Admin::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find admin by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<admin::Model>> {
        Admin::find()
            .filter(admin::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new admin.
    pub async fn create(&self, model: admin::ActiveModel) -> AppResult<admin::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
