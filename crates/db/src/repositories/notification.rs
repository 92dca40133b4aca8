//! Notification repository.

use std::sync::Arc;

use cohort_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::notification::NotificationTarget;
use crate::entities::{
    GroupNotification, Notification, group_notification, notification,
};

/// Repository for durable notification records.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification record.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a target's notifications, newest first.
    pub async fn find_by_target(
        &self,
        target_id: &str,
        target_kind: NotificationTarget,
    ) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::TargetId.eq(target_id))
            .filter(notification::Column::TargetKind.eq(target_kind))
            .order_by_desc(notification::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a notification as read.
    pub async fn mark_as_read(&self, id: &str) -> AppResult<()> {
        let notification = self.find_by_id(id).await?;
        if let Some(n) = notification {
            let mut active: notification::ActiveModel = n.into();
            active.is_read = Set(true);
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Append a broadcast entry to a group's notification log.
    pub async fn append_group_notification(
        &self,
        model: group_notification::ActiveModel,
    ) -> AppResult<group_notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a group's broadcast log, newest first.
    pub async fn find_by_group(
        &self,
        group_id: &str,
    ) -> AppResult<Vec<group_notification::Model>> {
        GroupNotification::find()
            .filter(group_notification::Column::GroupId.eq(group_id))
            .order_by_desc(group_notification::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_notification(id: &str, target_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            target_id: target_id.to_string(),
            target_kind: NotificationTarget::User,
            message: "Your request was approved".to_string(),
            data: None,
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_target() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    test_notification("ntf2", "usr1"),
                    test_notification("ntf1", "usr1"),
                ]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let found = repo
            .find_by_target("usr1", NotificationTarget::User)
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "ntf2");
    }
}
