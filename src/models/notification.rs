use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single-recipient in-app notification.
///
/// Broadcasts are stored as one row per recipient. Rows are never deleted
/// and `is_read` only ever flips false to true.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub organization: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    /// Structured payload; for role-change responses this carries the
    /// request id, target role, decision and admin response as JSON.
    pub data: Option<String>,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True for an unread approved role-change response.
    ///
    /// Such a notification must stay unread until the requester accepts
    /// it: the read flag is the acceptance marker, so the generic
    /// mark-read paths skip these rows.
    pub fn awaits_role_acceptance(&self) -> bool {
        if self.is_read || self.kind != NotificationKind::RoleChangeResponse.as_str() {
            return false;
        }
        self.data
            .as_deref()
            .and_then(|raw| serde_json::from_str::<RoleChangeResponseData>(raw).ok())
            .map(|payload| payload.action == "approved")
            .unwrap_or(false)
    }
}

/// Notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RoleChangeResponse,
    DirectMessage,
    Broadcast,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::RoleChangeResponse => "role_change_response",
            NotificationKind::DirectMessage => "direct_message",
            NotificationKind::Broadcast => "broadcast",
            NotificationKind::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload stored in `data` for `role_change_response` notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleChangeResponseData {
    pub role_change_request_id: i64,
    pub new_role: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_response: Option<String>,
}
