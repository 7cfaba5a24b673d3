use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[schema(value_type = String)]
    pub timestamp: DateTimeUtc,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub organization: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Audited actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    LoginSuccess,
    LoginFailed,
    RoleRequestSubmitted,
    RoleRequestApproved,
    RoleRequestRejected,
    RoleChangeAccepted,
    DirectMessageSent,
    BroadcastSent,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::LoginSuccess => "login_success",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::RoleRequestSubmitted => "role_request_submitted",
            AuditAction::RoleRequestApproved => "role_request_approved",
            AuditAction::RoleRequestRejected => "role_request_rejected",
            AuditAction::RoleChangeAccepted => "role_change_accepted",
            AuditAction::DirectMessageSent => "direct_message_sent",
            AuditAction::BroadcastSent => "broadcast_sent",
        };
        write!(f, "{}", s)
    }
}

/// Audited resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    User,
    RoleChangeRequest,
    Notification,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceType::User => "user",
            ResourceType::RoleChangeRequest => "role_change_request",
            ResourceType::Notification => "notification",
        };
        write!(f, "{}", s)
    }
}
