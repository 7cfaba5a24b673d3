use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;

use crate::db::DbConn;
use crate::error::Result;
use crate::models::audit_log::{self, AuditAction, ResourceType};

/// Audit service for logging security-relevant events
#[derive(Clone)]
pub struct AuditService {
    db: DbConn,
}

impl AuditService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Log an audit event
    #[allow(clippy::too_many_arguments)]
    pub async fn log(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<String>,
        user_id: Option<i64>,
        username: Option<String>,
        organization: Option<String>,
        details: Option<serde_json::Value>,
        success: bool,
        error_message: Option<String>,
    ) -> Result<()> {
        let entry = audit_log::ActiveModel {
            timestamp: Set(chrono::Utc::now()),
            user_id: Set(user_id),
            username: Set(username),
            organization: Set(organization),
            action: Set(action.to_string()),
            resource_type: Set(resource_type.to_string()),
            resource_id: Set(resource_id),
            details: Set(details.map(|d| d.to_string())),
            success: Set(success),
            error_message: Set(error_message),
            ..Default::default()
        };

        entry.insert(&self.db).await?;
        Ok(())
    }

    /// Log a successful action
    pub async fn log_success(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<String>,
        user: &crate::models::user::Model,
        details: Option<serde_json::Value>,
    ) -> Result<()> {
        self.log(
            action,
            resource_type,
            resource_id,
            Some(user.id),
            Some(user.username.clone()),
            Some(user.organization.clone()),
            details,
            true,
            None,
        )
        .await
    }

    /// Log a failed action without an authenticated user
    pub async fn log_failure(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        username: Option<String>,
        error_message: String,
    ) -> Result<()> {
        self.log(
            action,
            resource_type,
            None,
            None,
            username,
            None,
            None,
            false,
            Some(error_message),
        )
        .await
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuditPage {
    pub entries: Vec<audit_log::Model>,
    pub total: u64,
}

/// Fetch a newest-first page of audit log entries for one organization
pub async fn get_audit_logs(
    db: &DbConn,
    organization: &str,
    limit: u64,
    offset: u64,
) -> Result<AuditPage> {
    let filter = audit_log::Column::Organization.eq(organization);

    let total = audit_log::Entity::find()
        .filter(filter.clone())
        .count(db)
        .await?;

    let entries = audit_log::Entity::find()
        .filter(filter)
        .order_by_desc(audit_log::Column::Timestamp)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    Ok(AuditPage { entries, total })
}
