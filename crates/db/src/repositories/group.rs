//! Group repository.

use std::sync::Arc;

use chrono::Utc;
use cohort_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use crate::entities::join_request::RequestStatus;
use crate::entities::{
    Group, GroupMember, JoinRequest, group, group_member, join_request,
};

/// Repository for groups, memberships, and join requests.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

/// Maps an insert failure on the join request table.
///
/// The partial unique index on pending `(group_id, user_id)` pairs turns a
/// concurrent duplicate into a constraint violation instead of a race.
fn map_request_insert_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateRequest,
        _ => AppError::Database(e.to_string()),
    }
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Group Operations ====================

    /// Find group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<group::Model>> {
        Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get group by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<group::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {id}")))
    }

    /// Find a group only if it is owned by the given admin.
    pub async fn find_owned(
        &self,
        group_id: &str,
        admin_id: &str,
    ) -> AppResult<Option<group::Model>> {
        Group::find()
            .filter(group::Column::Id.eq(group_id))
            .filter(group::Column::CreatedBy.eq(admin_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List groups created by an admin, newest first.
    pub async fn find_by_admin(&self, admin_id: &str) -> AppResult<Vec<group::Model>> {
        Group::find()
            .filter(group::Column::CreatedBy.eq(admin_id))
            .order_by(group::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List every group, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<group::Model>> {
        Group::find()
            .order_by(group::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new group.
    pub async fn create(&self, model: group::ActiveModel) -> AppResult<group::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a group owned by the given admin.
    ///
    /// Fails with a combined not-found-or-unauthorized error so callers
    /// cannot distinguish a foreign group from a missing one.
    pub async fn update_owned(
        &self,
        group_id: &str,
        admin_id: &str,
        name: Option<String>,
        max_users: Option<i32>,
    ) -> AppResult<group::Model> {
        let group = self
            .find_owned(group_id, admin_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found or unauthorized".to_string()))?;

        let mut active: group::ActiveModel = group.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(max_users) = max_users {
            active.max_users = Set(max_users);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a group owned by the given admin.
    ///
    /// Join requests, memberships, and the broadcast log cascade with the
    /// row (the only cascade in the model).
    pub async fn delete_owned(&self, group_id: &str, admin_id: &str) -> AppResult<()> {
        let result = Group::delete_many()
            .filter(group::Column::Id.eq(group_id))
            .filter(group::Column::CreatedBy.eq(admin_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(
                "Group not found or unauthorized".to_string(),
            ));
        }

        Ok(())
    }

    // ==================== Member Operations ====================

    /// Count members in a group.
    pub async fn count_members(&self, group_id: &str) -> AppResult<u64> {
        GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List member rows of a group, oldest admission first.
    pub async fn list_members(&self, group_id: &str) -> AppResult<Vec<group_member::Model>> {
        GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .order_by(group_member::Column::JoinedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is a member of a group.
    pub async fn is_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let count = GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    // ==================== Join Request Operations ====================

    /// Insert a pending join request.
    ///
    /// A concurrent duplicate for the same `(group, user)` pair surfaces as
    /// [`AppError::DuplicateRequest`] via the unique index.
    pub async fn insert_request(
        &self,
        model: join_request::ActiveModel,
    ) -> AppResult<join_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(map_request_insert_err)
    }

    /// Find a join request by ID.
    pub async fn find_request_by_id(&self, id: &str) -> AppResult<Option<join_request::Model>> {
        JoinRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the pending request for a `(group, user)` pair, if any.
    pub async fn find_pending_request(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<Option<join_request::Model>> {
        JoinRequest::find()
            .filter(join_request::Column::GroupId.eq(group_id))
            .filter(join_request::Column::UserId.eq(user_id))
            .filter(join_request::Column::Status.eq(RequestStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List pending requests across every group owned by an admin.
    pub async fn list_pending_for_admin(
        &self,
        admin_id: &str,
    ) -> AppResult<Vec<join_request::Model>> {
        let groups = self.find_by_admin(admin_id).await?;
        let group_ids: Vec<String> = groups.into_iter().map(|g| g.id).collect();

        if group_ids.is_empty() {
            return Ok(vec![]);
        }

        JoinRequest::find()
            .filter(join_request::Column::GroupId.is_in(group_ids))
            .filter(join_request::Column::Status.eq(RequestStatus::Pending))
            .order_by(join_request::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's requests with the given status.
    pub async fn list_requests_by_user(
        &self,
        user_id: &str,
        status: RequestStatus,
    ) -> AppResult<Vec<join_request::Model>> {
        JoinRequest::find()
            .filter(join_request::Column::UserId.eq(user_id))
            .filter(join_request::Column::Status.eq(status))
            .order_by(join_request::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the groups a user has been approved into.
    pub async fn list_approved_groups(&self, user_id: &str) -> AppResult<Vec<group::Model>> {
        let requests = self
            .list_requests_by_user(user_id, RequestStatus::Approved)
            .await?;
        let group_ids: Vec<String> = requests.into_iter().map(|r| r.group_id).collect();

        if group_ids.is_empty() {
            return Ok(vec![]);
        }

        Group::find()
            .filter(group::Column::Id.is_in(group_ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip a request `pending -> rejected`.
    ///
    /// The conditional update touches zero rows when the request is missing
    /// or already terminal, so replays are rejected rather than reapplied.
    pub async fn reject_if_pending(&self, request_id: &str) -> AppResult<()> {
        let result = JoinRequest::update_many()
            .col_expr(
                join_request::Column::Status,
                Expr::value(RequestStatus::Rejected),
            )
            .col_expr(join_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(join_request::Column::Id.eq(request_id))
            .filter(join_request::Column::Status.eq(RequestStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::RequestAlreadyProcessed);
        }

        Ok(())
    }

    /// Approve a pending request, admitting the user to the group.
    ///
    /// Runs inside a transaction so the capacity check and the membership
    /// insert cannot interleave with a concurrent approval. On a full group
    /// the transaction rolls back and the request stays pending; a fresh
    /// admin action is required.
    ///
    /// `member_row_id` is the pre-generated id for the new membership row.
    pub async fn approve_request(
        &self,
        request_id: &str,
        member_row_id: &str,
    ) -> AppResult<join_request::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let request = JoinRequest::find_by_id(request_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or(AppError::RequestAlreadyProcessed)?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::RequestAlreadyProcessed);
        }

        let group = Group::find_by_id(&request.group_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

        let member_count = GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group.id.as_str()))
            .count(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if member_count >= u64::try_from(group.max_users.max(0)).unwrap_or(0) {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::GroupFull);
        }

        let now = Utc::now();
        let member = group_member::ActiveModel {
            id: Set(member_row_id.to_string()),
            group_id: Set(request.group_id.clone()),
            user_id: Set(request.user_id.clone()),
            joined_at: Set(now.into()),
        };
        member
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let flipped = JoinRequest::update_many()
            .col_expr(
                join_request::Column::Status,
                Expr::value(RequestStatus::Approved),
            )
            .col_expr(join_request::Column::UpdatedAt, Expr::value(now))
            .filter(join_request::Column::Id.eq(request_id))
            .filter(join_request::Column::Status.eq(RequestStatus::Pending))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if flipped.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::RequestAlreadyProcessed);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(join_request::Model {
            status: RequestStatus::Approved,
            updated_at: Some(now.into()),
            ..request
        })
    }
}
