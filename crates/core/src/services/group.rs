//! Group membership service.
//!
//! The state machine behind admin-owned, capacity-bounded groups: group
//! CRUD, join requests, and the approve/reject workflow. Capacity is
//! enforced only when an admin approves a request, never when the request
//! is filed.

use cohort_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use cohort_db::entities::join_request::RequestStatus;
use cohort_db::entities::{group, join_request};
use cohort_db::repositories::{GroupRepository, UserRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::notification::{NotificationService, NotifyChannel};

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 1))]
    pub max_users: i32,
}

/// Input for updating a group.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub max_users: Option<i32>,
}

/// Admin decision on a pending join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveAction {
    Approve,
    Reject,
}

/// A member profile embedded in group listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// A group with its member profiles, as admins see it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupWithMembers {
    pub id: String,
    pub name: String,
    pub max_users: i32,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub members: Vec<MemberProfile>,
}

/// A group as users browsing for one see it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableGroup {
    pub id: String,
    pub name: String,
    pub max_users: i32,
    pub member_count: u64,
}

/// A pending join request with requester and group context.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestDetail {
    pub id: String,
    pub group_id: String,
    pub group_name: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Service for managing groups and the join workflow.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    user_repo: UserRepository,
    notifications: Option<NotificationService>,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository, user_repo: UserRepository) -> Self {
        Self {
            group_repo,
            user_repo,
            notifications: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Attach the notification service so membership decisions fan out.
    pub fn set_notifications(&mut self, notifications: NotificationService) {
        self.notifications = Some(notifications);
    }

    // ==================== Group Operations ====================

    /// Create a new group owned by `admin_id`.
    pub async fn create(&self, admin_id: &str, input: CreateGroupInput) -> AppResult<group::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            max_users: Set(input.max_users),
            created_by: Set(admin_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.group_repo.create(model).await
    }

    /// List an admin's groups with member profiles.
    pub async fn list_with_members(&self, admin_id: &str) -> AppResult<Vec<GroupWithMembers>> {
        let groups = self.group_repo.find_by_admin(admin_id).await?;

        let mut result = Vec::with_capacity(groups.len());
        for g in groups {
            let member_rows = self.group_repo.list_members(&g.id).await?;
            let user_ids: Vec<String> = member_rows.into_iter().map(|m| m.user_id).collect();
            let users = self.user_repo.find_by_ids(&user_ids).await?;

            result.push(GroupWithMembers {
                id: g.id,
                name: g.name,
                max_users: g.max_users,
                created_by: g.created_by,
                created_at: g.created_at.into(),
                members: users
                    .into_iter()
                    .map(|u| MemberProfile {
                        id: u.id,
                        username: u.username,
                        email: u.email,
                    })
                    .collect(),
            });
        }

        Ok(result)
    }

    /// Update a group owned by `admin_id`.
    pub async fn update(
        &self,
        admin_id: &str,
        group_id: &str,
        input: UpdateGroupInput,
    ) -> AppResult<group::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.group_repo
            .update_owned(group_id, admin_id, input.name, input.max_users)
            .await
    }

    /// Delete a group owned by `admin_id`, cascading its join requests,
    /// memberships, and broadcast log.
    pub async fn delete(&self, admin_id: &str, group_id: &str) -> AppResult<()> {
        self.group_repo.delete_owned(group_id, admin_id).await
    }

    /// List every group with its occupancy, for users browsing.
    pub async fn list_available(&self) -> AppResult<Vec<AvailableGroup>> {
        let groups = self.group_repo.find_all().await?;

        let mut result = Vec::with_capacity(groups.len());
        for g in groups {
            let member_count = self.group_repo.count_members(&g.id).await?;
            result.push(AvailableGroup {
                id: g.id,
                name: g.name,
                max_users: g.max_users,
                member_count,
            });
        }

        Ok(result)
    }

    // ==================== Join Workflow ====================

    /// File a join request for a user.
    ///
    /// Capacity is not checked here; a full group happily accumulates
    /// pending requests. One pending request per `(group, user)` pair.
    pub async fn request_join(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> AppResult<join_request::Model> {
        if self.group_repo.find_by_id(group_id).await?.is_none() {
            return Err(AppError::NotFound("Group not found".to_string()));
        }

        if self
            .group_repo
            .find_pending_request(group_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateRequest);
        }

        let model = join_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            user_id: Set(user_id.to_string()),
            status: Set(RequestStatus::Pending),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        // The partial unique index turns a concurrent duplicate into
        // DuplicateRequest instead of a second pending row.
        self.group_repo.insert_request(model).await
    }

    /// List pending requests across an admin's groups, with requester and
    /// group context.
    pub async fn pending_requests(&self, admin_id: &str) -> AppResult<Vec<JoinRequestDetail>> {
        let requests = self.group_repo.list_pending_for_admin(admin_id).await?;

        let mut result = Vec::with_capacity(requests.len());
        for r in requests {
            let group = self.group_repo.get_by_id(&r.group_id).await?;
            let user = self.user_repo.get_by_id(&r.user_id).await?;

            result.push(JoinRequestDetail {
                id: r.id,
                group_id: r.group_id,
                group_name: group.name,
                user_id: r.user_id,
                username: user.username,
                email: user.email,
                created_at: r.created_at.into(),
            });
        }

        Ok(result)
    }

    /// Resolve a pending request.
    ///
    /// Approval admits the requester unless the group is at capacity, in
    /// which case the request stays pending and a fresh admin action is
    /// required. A request that is missing or already terminal fails with
    /// [`AppError::RequestAlreadyProcessed`] either way; replays are never
    /// silently reapplied.
    pub async fn resolve(
        &self,
        request_id: &str,
        action: ResolveAction,
    ) -> AppResult<join_request::Model> {
        match action {
            ResolveAction::Approve => {
                let approved = self
                    .group_repo
                    .approve_request(request_id, &self.id_gen.generate())
                    .await?;

                self.notify_decision(&approved, "approved").await;
                Ok(approved)
            }
            ResolveAction::Reject => {
                let request = self
                    .group_repo
                    .find_request_by_id(request_id)
                    .await?
                    .ok_or(AppError::RequestAlreadyProcessed)?;

                self.group_repo.reject_if_pending(request_id).await?;

                let rejected = join_request::Model {
                    status: RequestStatus::Rejected,
                    ..request
                };
                self.notify_decision(&rejected, "rejected").await;
                Ok(rejected)
            }
        }
    }

    /// List the groups a user has been approved into.
    pub async fn approved_groups(&self, user_id: &str) -> AppResult<Vec<group::Model>> {
        self.group_repo.list_approved_groups(user_id).await
    }

    /// Push a membership decision to the requester's channel.
    ///
    /// Best effort: a failed fan-out never fails the admin's action.
    async fn notify_decision(&self, request: &join_request::Model, decision: &str) {
        let Some(ref notifications) = self.notifications else {
            return;
        };

        let group_name = match self.group_repo.find_by_id(&request.group_id).await {
            Ok(Some(g)) => g.name,
            _ => request.group_id.clone(),
        };

        notifications
            .notify(
                &request.user_id,
                &format!("Your request to join {group_name} was {decision}"),
                serde_json::json!({
                    "groupId": request.group_id,
                    "groupName": group_name,
                    "status": decision,
                }),
                NotifyChannel::User,
            )
            .await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn test_group(id: &str, admin_id: &str, name: &str, max_users: i32) -> group::Model {
        group::Model {
            id: id.to_string(),
            name: name.to_string(),
            max_users,
            created_by: admin_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_request(id: &str, group_id: &str, user_id: &str) -> join_request::Model {
        join_request::Model {
            id: id.to_string(),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            status: RequestStatus::Pending,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    fn service_over(db: Arc<sea_orm::DatabaseConnection>) -> GroupService {
        GroupService::new(
            GroupRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_zero_capacity() {
        let service = service_over(cohort_db::test_utils::mock_db());

        let err = service
            .create(
                "adm1",
                CreateGroupInput {
                    name: "Alpha".to_string(),
                    max_users: 0,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_request_join_unknown_group() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let err = service.request_join("usr1", "missing").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_request_join_duplicate() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("grp1", "adm1", "Alpha", 3)]])
                .append_query_results([[test_request("req1", "grp1", "usr1")]])
                .into_connection(),
        );
        let service = service_over(db);

        let err = service.request_join("usr1", "grp1").await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateRequest));
    }

    #[tokio::test]
    async fn test_request_join_files_pending_request() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("grp1", "adm1", "Alpha", 3)]])
                .append_query_results([Vec::<join_request::Model>::new()])
                .append_query_results([[test_request("req1", "grp1", "usr1")]])
                .into_connection(),
        );
        let service = service_over(db);

        let request = service.request_join("usr1", "grp1").await.unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.group_id, "grp1");
    }

    #[tokio::test]
    async fn test_approve_full_group_leaves_request_pending() {
        // Scenario from the workflow: capacity 1, one member admitted, a
        // second request arrives. Approval fails with GroupFull and the
        // request is not auto-rejected.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_request("req2", "grp1", "usr-b")]])
                .append_query_results([[test_group("grp1", "adm1", "Alpha", 1)]])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );
        let service = service_over(db);

        let err = service
            .resolve("req2", ResolveAction::Approve)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GroupFull));
    }

    #[tokio::test]
    async fn test_reject_flips_status() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_request("req1", "grp1", "usr1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = service_over(db);

        let rejected = service
            .resolve("req1", ResolveAction::Reject)
            .await
            .unwrap();

        assert_eq!(rejected.status, RequestStatus::Rejected);
    }

    #[tokio::test]
    async fn test_reject_replay_is_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[join_request::Model {
                    status: RequestStatus::Rejected,
                    ..test_request("req1", "grp1", "usr1")
                }]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = service_over(db);

        let err = service
            .resolve("req1", ResolveAction::Reject)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RequestAlreadyProcessed));
    }

    #[tokio::test]
    async fn test_approved_groups_empty_without_requests() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<join_request::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let groups = service.approved_groups("usr1").await.unwrap();

        assert!(groups.is_empty());
    }
}
