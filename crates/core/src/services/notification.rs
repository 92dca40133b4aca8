//! Notification service.
//!
//! Fan-out order is fixed: live delivery first, durable record second. The
//! durable write is best effort; a failed insert is logged and never
//! surfaced, so the caller's response reflects live delivery only.

use cohort_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use cohort_db::entities::notification::NotificationTarget;
use cohort_db::entities::{group_notification, notification};
use cohort_db::repositories::{GroupRepository, NotificationRepository};
use sea_orm::Set;
use serde::Serialize;

use crate::services::event_publisher::{EventPublisherService, NotificationEvent};

/// Which channel a notification addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    /// A single user's room; durable copy is a notification row.
    User,
    /// A single member's room; durable copy is a notification row.
    Member,
    /// A group room; durable copy goes to the group's broadcast log.
    Group,
}

/// One group's broadcast history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBroadcastLog {
    pub group_id: String,
    pub group_name: String,
    pub notifications: Vec<group_notification::Model>,
}

/// Service for real-time notification fan-out and its durable log.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    group_repo: GroupRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        group_repo: GroupRepository,
    ) -> Self {
        Self {
            notification_repo,
            group_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Deliver a notification to a target's room and record it durably.
    ///
    /// Never fails: publish and persistence errors are logged and the
    /// delivery attempt stands.
    pub async fn notify(
        &self,
        target_id: &str,
        message: &str,
        data: serde_json::Value,
        channel: NotifyChannel,
    ) {
        if let Some(ref event_publisher) = self.event_publisher {
            let event = NotificationEvent {
                target_id: target_id.to_string(),
                message: message.to_string(),
                data: data.clone(),
            };
            if let Err(e) = event_publisher.publish_notification(event).await {
                tracing::warn!(error = %e, target_id = %target_id, "Failed to publish notification event");
            }
        }

        if let Err(e) = self.persist(target_id, message, data, channel).await {
            tracing::warn!(error = %e, target_id = %target_id, "Failed to persist notification");
        }
    }

    /// Broadcast to every member of one group owned by `admin_id`.
    ///
    /// Each member's user room gets the message, the group room gets one
    /// copy, and the group's broadcast log grows by one entry. Returns how
    /// many members were addressed.
    pub async fn notify_group(
        &self,
        admin_id: &str,
        group_id: &str,
        message: &str,
    ) -> AppResult<usize> {
        let group = self
            .group_repo
            .find_owned(group_id, admin_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found or unauthorized".to_string()))?;

        Ok(self.broadcast_to_group(&group.id, &group.name, message).await)
    }

    /// Broadcast to every member of every group owned by `admin_id`.
    ///
    /// Returns how many members were addressed across all groups.
    pub async fn notify_all_groups(&self, admin_id: &str, message: &str) -> AppResult<usize> {
        let groups = self.group_repo.find_by_admin(admin_id).await?;
        if groups.is_empty() {
            return Err(AppError::NotFound(
                "No groups found for this admin".to_string(),
            ));
        }

        let mut notified = 0;
        for group in groups {
            notified += self.broadcast_to_group(&group.id, &group.name, message).await;
        }

        Ok(notified)
    }

    /// The broadcast history of every group owned by `admin_id`.
    pub async fn group_broadcast_logs(&self, admin_id: &str) -> AppResult<Vec<GroupBroadcastLog>> {
        let groups = self.group_repo.find_by_admin(admin_id).await?;

        let mut result = Vec::with_capacity(groups.len());
        for group in groups {
            let notifications = self.notification_repo.find_by_group(&group.id).await?;
            result.push(GroupBroadcastLog {
                group_id: group.id,
                group_name: group.name,
                notifications,
            });
        }

        Ok(result)
    }

    /// A target's stored notifications, newest first.
    pub async fn notifications_for(
        &self,
        target_id: &str,
        target_kind: NotificationTarget,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_target(target_id, target_kind)
            .await
    }

    /// Mark one stored notification as read.
    pub async fn mark_as_read(&self, notification_id: &str) -> AppResult<()> {
        self.notification_repo.mark_as_read(notification_id).await
    }

    /// Emit to each member's room and the group room, then log once.
    async fn broadcast_to_group(&self, group_id: &str, group_name: &str, message: &str) -> usize {
        let data = serde_json::json!({
            "groupId": group_id,
            "groupName": group_name,
        });

        let members = match self.group_repo.list_members(group_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(error = %e, group_id = %group_id, "Failed to load group members for broadcast");
                return 0;
            }
        };

        for member in &members {
            self.notify(&member.user_id, message, data.clone(), NotifyChannel::User)
                .await;
        }

        self.notify(group_id, message, data, NotifyChannel::Group)
            .await;

        members.len()
    }

    /// Write the durable copy for one notification.
    async fn persist(
        &self,
        target_id: &str,
        message: &str,
        data: serde_json::Value,
        channel: NotifyChannel,
    ) -> AppResult<()> {
        match channel {
            NotifyChannel::User | NotifyChannel::Member => {
                let target_kind = if channel == NotifyChannel::Member {
                    NotificationTarget::Member
                } else {
                    NotificationTarget::User
                };

                let model = notification::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    target_id: Set(target_id.to_string()),
                    target_kind: Set(target_kind),
                    message: Set(message.to_string()),
                    data: Set(Some(data)),
                    is_read: Set(false),
                    created_at: Set(Utc::now().into()),
                };
                self.notification_repo.create(model).await?;
            }
            NotifyChannel::Group => {
                let model = group_notification::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    group_id: Set(target_id.to_string()),
                    message: Set(message.to_string()),
                    created_at: Set(Utc::now().into()),
                };
                self.notification_repo.append_group_notification(model).await?;
            }
        }

        Ok(())
    }
}
