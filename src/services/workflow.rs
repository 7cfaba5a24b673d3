//! Role-change request workflow.
//!
//! A staff member submits a request to move to a different role; an
//! administrator of the same organization approves or rejects it exactly
//! once. Resolution updates the request and creates the requester's
//! notification inside one transaction. The live role is only mutated when
//! the requester explicitly accepts the approved change from their inbox —
//! approval alone never touches the account.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::notification::{self, NotificationKind, RoleChangeResponseData};
use crate::models::role_change_request::{self, RequestStatus};
use crate::models::staff_role::StaffRole;
use crate::models::user;
use crate::services::audit::AuditService;
use crate::services::notification::NotificationService;

/// Administrator decision on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }

    fn status(&self) -> RequestStatus {
        match self {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }

    fn audit_action(&self) -> AuditAction {
        match self {
            Decision::Approved => AuditAction::RoleRequestApproved,
            Decision::Rejected => AuditAction::RoleRequestRejected,
        }
    }
}

/// Orchestrates the role-change request lifecycle
#[derive(Clone)]
pub struct RoleChangeService {
    db: DbConn,
    notifications: NotificationService,
    audit: AuditService,
}

impl RoleChangeService {
    pub fn new(db: DbConn, notifications: NotificationService, audit: AuditService) -> Self {
        Self {
            db,
            notifications,
            audit,
        }
    }

    /// Submit a new pending request for the authenticated caller.
    ///
    /// The organization and the requester's name/email snapshot always come
    /// from the caller's account, never from client input. Administrators
    /// are not notified; they list pending requests on demand.
    pub async fn submit(
        &self,
        requester: &user::Model,
        to_role: StaffRole,
        reason: Option<String>,
    ) -> Result<role_change_request::Model> {
        let from_role = requester
            .staff_role()
            .ok_or_else(|| AppError::Internal("Account has an invalid role".to_string()))?;

        if to_role == from_role {
            return Err(AppError::BadRequest(
                "Requested role must differ from current role".to_string(),
            ));
        }

        let row = role_change_request::ActiveModel {
            user_id: Set(requester.id),
            organization: Set(requester.organization.clone()),
            from_role: Set(from_role.as_str().to_string()),
            to_role: Set(to_role.as_str().to_string()),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            requested_by_name: Set(requester.display_name.clone()),
            requested_by_email: Set(requester.email.clone()),
            reason: Set(reason.filter(|r| !r.trim().is_empty())),
            admin_response: Set(None),
            created_at: Set(Utc::now()),
            processed_at: Set(None),
            processed_by: Set(None),
            ..Default::default()
        };
        let created = row.insert(&self.db).await?;

        if let Err(e) = self
            .audit
            .log_success(
                AuditAction::RoleRequestSubmitted,
                ResourceType::RoleChangeRequest,
                Some(created.id.to_string()),
                requester,
                Some(serde_json::json!({
                    "from_role": created.from_role,
                    "to_role": created.to_role,
                })),
            )
            .await
        {
            tracing::warn!("Failed to audit role request submission: {}", e);
        }

        Ok(created)
    }

    /// List requests for the caller's organization, newest first.
    ///
    /// Fail-soft: non-administrators get an empty list rather than an
    /// error. The scope is always the caller's own organization.
    pub async fn list_for(&self, caller: &user::Model) -> Result<Vec<role_change_request::Model>> {
        match caller.staff_role() {
            Some(role) if role.is_administrator() => {}
            _ => return Ok(Vec::new()),
        }

        let requests = role_change_request::Entity::find()
            .filter(role_change_request::Column::Organization.eq(&caller.organization))
            .order_by_desc(role_change_request::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(requests)
    }

    /// Resolve a pending request.
    ///
    /// The request update and the requester's notification are written in
    /// one transaction: either both land or neither does. A request that is
    /// no longer pending yields `Conflict` and creates no second
    /// notification. Requests outside the administrator's organization are
    /// reported as not found.
    pub async fn resolve(
        &self,
        admin: &user::Model,
        request_id: i64,
        decision: Decision,
        admin_response: Option<String>,
    ) -> Result<role_change_request::Model> {
        let txn = self.db.begin().await?;

        let request = role_change_request::Entity::find_by_id(request_id)
            .one(&txn)
            .await?
            .filter(|r| r.organization == admin.organization)
            .ok_or_else(|| AppError::NotFound("Role change request not found".to_string()))?;

        if RequestStatus::parse(&request.status) != Some(RequestStatus::Pending) {
            return Err(AppError::Conflict(
                "Request has already been processed".to_string(),
            ));
        }

        let response = admin_response.filter(|r| !r.trim().is_empty());

        let mut active: role_change_request::ActiveModel = request.clone().into();
        active.status = Set(decision.status().as_str().to_string());
        active.admin_response = Set(response.clone());
        active.processed_at = Set(Some(Utc::now()));
        active.processed_by = Set(Some(admin.id));
        let updated = active.update(&txn).await?;

        let title = match decision {
            Decision::Approved => "Role Change Approved",
            Decision::Rejected => "Role Change Rejected",
        };
        let mut message = match decision {
            Decision::Approved => format!(
                "Your request to change your role to {} has been approved. \
                 Accept the change from this notification to activate it.",
                request.to_role
            ),
            Decision::Rejected => format!(
                "Your request to change your role to {} has been rejected.",
                request.to_role
            ),
        };
        if let Some(text) = &response {
            message.push_str(&format!(" Admin response: {}", text));
        }

        let data = serde_json::to_string(&RoleChangeResponseData {
            role_change_request_id: request.id,
            new_role: request.to_role.clone(),
            action: decision.as_str().to_string(),
            admin_response: response,
        })?;

        NotificationService::insert_on(
            &txn,
            request.user_id,
            &request.organization,
            NotificationKind::RoleChangeResponse,
            title,
            &message,
            Some(data),
        )
        .await?;

        txn.commit().await?;
        self.notifications.publish(request.user_id);

        if let Err(e) = self
            .audit
            .log_success(
                decision.audit_action(),
                ResourceType::RoleChangeRequest,
                Some(request.id.to_string()),
                admin,
                Some(serde_json::json!({ "to_role": request.to_role })),
            )
            .await
        {
            tracing::warn!("Failed to audit role request resolution: {}", e);
        }

        Ok(updated)
    }

    /// Accept an approved role change from its inbox notification.
    ///
    /// This is the only code path that mutates the live role. The role
    /// write and the read flag flip happen in one transaction. Accepting an
    /// already-read notification is a no-op, so repeated clicks are
    /// harmless.
    pub async fn accept(&self, caller: &user::Model, notification_id: i64) -> Result<()> {
        let txn = self.db.begin().await?;

        let found = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(caller.id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if found.kind != NotificationKind::RoleChangeResponse.as_str() {
            return Err(AppError::BadRequest(
                "Notification is not a role change response".to_string(),
            ));
        }

        let raw = found.data.as_deref().ok_or_else(|| {
            AppError::BadRequest("Notification carries no role change payload".to_string())
        })?;
        let payload: RoleChangeResponseData = serde_json::from_str(raw)?;

        if payload.action != Decision::Approved.as_str() {
            return Err(AppError::BadRequest(
                "Only approved role changes can be accepted".to_string(),
            ));
        }

        if found.is_read {
            // Already accepted
            return Ok(());
        }

        let new_role = StaffRole::parse(&payload.new_role).ok_or_else(|| {
            AppError::Internal("Notification payload carries an invalid role".to_string())
        })?;

        let account = user::Entity::find_by_id(caller.id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        let mut account_active: user::ActiveModel = account.into();
        account_active.role = Set(new_role.as_str().to_string());
        account_active.updated_at = Set(Utc::now());
        account_active.update(&txn).await?;

        let mut notification_active: notification::ActiveModel = found.into();
        notification_active.is_read = Set(true);
        notification_active.update(&txn).await?;

        txn.commit().await?;
        self.notifications.publish(caller.id);

        if let Err(e) = self
            .audit
            .log_success(
                AuditAction::RoleChangeAccepted,
                ResourceType::User,
                Some(caller.id.to_string()),
                caller,
                Some(serde_json::json!({ "new_role": new_role.as_str() })),
            )
            .await
        {
            tracing::warn!("Failed to audit role change acceptance: {}", e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::PaginatorTrait;
    use tokio::sync::broadcast;

    use crate::test_helpers::{create_test_db, create_test_user};

    fn build_services(db: DbConn) -> (RoleChangeService, NotificationService) {
        let (tx, _) = broadcast::channel(16);
        let notifications = NotificationService::new(db.clone(), tx);
        let audit = AuditService::new(db.clone());
        (
            RoleChangeService::new(db, notifications.clone(), audit),
            notifications,
        )
    }

    #[tokio::test]
    async fn test_submit_same_role_rejected_without_insert() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let (workflow, _) = build_services(db.clone());

        let err = workflow
            .submit(&alice, StaffRole::Pharmacist, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let rows = role_change_request::Entity::find().count(&db).await.unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_approve_then_accept_scenario() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let (workflow, notifications) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::Manager, Some("covering shift lead".to_string()))
            .await
            .unwrap();
        assert_eq!(request.status, "pending");
        assert!(request.processed_at.is_none());
        assert!(request.processed_by.is_none());

        let resolved = workflow
            .resolve(
                &admin,
                request.id,
                Decision::Approved,
                Some("Welcome aboard".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, "approved");
        assert!(resolved.processed_at.is_some());
        assert_eq!(resolved.processed_by, Some(admin.id));

        // Exactly one notification, with the full payload
        let inbox = notifications.list_for_user(alice.id, 10, 0).await.unwrap();
        assert_eq!(inbox.len(), 1);
        let note = &inbox[0];
        assert_eq!(note.title, "Role Change Approved");
        assert!(note.message.contains("Admin response: Welcome aboard"));
        let payload: RoleChangeResponseData =
            serde_json::from_str(note.data.as_deref().unwrap()).unwrap();
        assert_eq!(payload.role_change_request_id, request.id);
        assert_eq!(payload.new_role, "manager");
        assert_eq!(payload.action, "approved");
        assert_eq!(payload.admin_response.as_deref(), Some("Welcome aboard"));

        // Role is untouched until acceptance
        let before = user::Entity::find_by_id(alice.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.role, "pharmacist");

        workflow.accept(&alice, note.id).await.unwrap();

        let after = user::Entity::find_by_id(alice.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.role, "manager");
        assert_eq!(notifications.unread_count(alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reject_with_empty_response_omits_suffix() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let (workflow, notifications) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::Manager, None)
            .await
            .unwrap();
        workflow
            .resolve(&admin, request.id, Decision::Rejected, Some("".to_string()))
            .await
            .unwrap();

        let inbox = notifications.list_for_user(alice.id, 10, 0).await.unwrap();
        assert_eq!(inbox.len(), 1);
        let note = &inbox[0];
        assert_eq!(note.title, "Role Change Rejected");
        assert!(!note.message.contains("Admin response:"));

        // A rejected response cannot be accepted and the role stays put
        let err = workflow.accept(&alice, note.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let account = user::Entity::find_by_id(alice.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.role, "pharmacist");
    }

    #[tokio::test]
    async fn test_double_resolve_conflicts_without_second_notification() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let (workflow, notifications) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::Manager, None)
            .await
            .unwrap();
        let first = workflow
            .resolve(&admin, request.id, Decision::Approved, None)
            .await
            .unwrap();

        let err = workflow
            .resolve(&admin, request.id, Decision::Rejected, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let inbox = notifications.list_for_user(alice.id, 10, 0).await.unwrap();
        assert_eq!(inbox.len(), 1);

        let unchanged = role_change_request::Entity::find_by_id(request.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.status, "approved");
        assert_eq!(unchanged.processed_at, first.processed_at);
    }

    #[tokio::test]
    async fn test_accept_is_idempotent() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let (workflow, notifications) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::PharmacyTech, None)
            .await
            .unwrap();
        workflow
            .resolve(&admin, request.id, Decision::Approved, None)
            .await
            .unwrap();
        let note_id = notifications.list_for_user(alice.id, 1, 0).await.unwrap()[0].id;

        workflow.accept(&alice, note_id).await.unwrap();
        workflow.accept(&alice, note_id).await.unwrap();

        let account = user::Entity::find_by_id(alice.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.role, "pharmacy_tech");
        assert_eq!(notifications.unread_count(alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_resolution_and_acceptance_notify_subscribers() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let (workflow, notifications) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::Manager, None)
            .await
            .unwrap();

        let mut rx = notifications.subscribe();
        workflow
            .resolve(&admin, request.id, Decision::Approved, None)
            .await
            .unwrap();
        assert_eq!(rx.try_recv().unwrap().user_id, alice.id);

        let note_id = notifications.list_for_user(alice.id, 1, 0).await.unwrap()[0].id;
        workflow.accept(&alice, note_id).await.unwrap();
        assert_eq!(rx.try_recv().unwrap().user_id, alice.id);
    }

    #[tokio::test]
    async fn test_generic_read_paths_leave_approval_pending() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let (workflow, notifications) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::Manager, None)
            .await
            .unwrap();
        workflow
            .resolve(&admin, request.id, Decision::Approved, None)
            .await
            .unwrap();
        let note_id = notifications.list_for_user(alice.id, 1, 0).await.unwrap()[0].id;

        // Neither read path consumes the pending approval
        notifications.mark_all_as_read(alice.id).await.unwrap();
        assert_eq!(notifications.unread_count(alice.id).await.unwrap(), 1);
        notifications.mark_as_read(note_id, alice.id).await.unwrap();
        assert_eq!(notifications.unread_count(alice.id).await.unwrap(), 1);

        // Acceptance still applies
        workflow.accept(&alice, note_id).await.unwrap();
        let account = user::Entity::find_by_id(alice.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.role, "manager");
        assert_eq!(notifications.unread_count(alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_all_consumes_rejected_response() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let (workflow, notifications) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::Manager, None)
            .await
            .unwrap();
        workflow
            .resolve(&admin, request.id, Decision::Rejected, None)
            .await
            .unwrap();

        notifications.mark_all_as_read(alice.id).await.unwrap();
        assert_eq!(notifications.unread_count(alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_is_fail_soft_and_org_scoped() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let admin = create_test_user(&db, "admin", "central", StaffRole::Administrator).await;
        let other_admin =
            create_test_user(&db, "west", "west-side", StaffRole::Administrator).await;
        let (workflow, _) = build_services(db.clone());

        workflow
            .submit(&alice, StaffRole::Manager, None)
            .await
            .unwrap();

        // Non-administrator: empty, not an error
        assert!(workflow.list_for(&alice).await.unwrap().is_empty());
        // Administrator of another organization sees nothing
        assert!(workflow.list_for(&other_admin).await.unwrap().is_empty());
        // Administrator of the requester's organization sees it
        assert_eq!(workflow.list_for(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_cross_org_request_is_not_found() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "central", StaffRole::Pharmacist).await;
        let other_admin =
            create_test_user(&db, "west", "west-side", StaffRole::Administrator).await;
        let (workflow, _) = build_services(db.clone());

        let request = workflow
            .submit(&alice, StaffRole::Manager, None)
            .await
            .unwrap();
        let err = workflow
            .resolve(&other_admin, request.id, Decision::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
