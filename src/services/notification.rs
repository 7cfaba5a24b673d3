//! In-app notification dispatch and inbox queries.
//!
//! Every notification targets exactly one recipient; a broadcast is stored
//! as one row per recipient, inserted inside a single transaction so a
//! partial batch can never be observed. After each insert an in-process
//! event is published so connected WebSocket clients can refresh their
//! unread counts.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::notification::{self, NotificationKind};
use crate::models::user;

/// Event published whenever a user's inbox changes
#[derive(Debug, Clone, Copy)]
pub struct NotificationEvent {
    pub user_id: i64,
}

/// Recipient selection for a broadcast
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastRecipients {
    /// Every active staff member of the sender's organization, sender excluded
    AllStaff,
    /// An explicit set of user ids; must be non-empty
    Explicit(Vec<i64>),
}

/// Notification service managing the per-user inbox
#[derive(Clone)]
pub struct NotificationService {
    db: DbConn,
    events: broadcast::Sender<NotificationEvent>,
}

impl NotificationService {
    pub fn new(db: DbConn, events: broadcast::Sender<NotificationEvent>) -> Self {
        Self { db, events }
    }

    /// Insert a notification row on the given connection.
    ///
    /// Takes any connection so callers composing multi-row effects (request
    /// resolution, broadcasts) can pass their open transaction.
    pub(crate) async fn insert_on<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        organization: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
        data: Option<String>,
    ) -> Result<notification::Model> {
        let row = notification::ActiveModel {
            user_id: Set(user_id),
            organization: Set(organization.to_string()),
            kind: Set(kind.as_str().to_string()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            data: Set(data),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        Ok(row.insert(conn).await?)
    }

    /// Notify connected clients that a user's inbox changed.
    ///
    /// Send failure only means nobody is subscribed.
    pub(crate) fn publish(&self, user_id: i64) {
        let _ = self.events.send(NotificationEvent { user_id });
    }

    /// Send a direct message to a single staff member of the sender's organization
    pub async fn send_direct_message(
        &self,
        sender: &user::Model,
        recipient_id: i64,
        title: &str,
        message: &str,
    ) -> Result<notification::Model> {
        let recipient = user::Entity::find_by_id(recipient_id)
            .filter(user::Column::Organization.eq(&sender.organization))
            .filter(user::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        let row = Self::insert_on(
            &self.db,
            recipient.id,
            &sender.organization,
            NotificationKind::DirectMessage,
            title,
            message,
            None,
        )
        .await?;

        self.publish(recipient.id);
        Ok(row)
    }

    /// Send a broadcast to many staff members of the sender's organization.
    ///
    /// Returns the number of notifications inserted. All rows are written in
    /// one transaction. Ids outside the organization are skipped; the sender
    /// never receives their own broadcast.
    pub async fn send_broadcast(
        &self,
        sender: &user::Model,
        title: &str,
        message: &str,
        recipients: BroadcastRecipients,
    ) -> Result<u64> {
        let mut query = user::Entity::find()
            .filter(user::Column::Organization.eq(&sender.organization))
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::Id.ne(sender.id));

        match &recipients {
            BroadcastRecipients::AllStaff => {}
            BroadcastRecipients::Explicit(ids) => {
                if ids.is_empty() {
                    return Err(AppError::BadRequest(
                        "Recipient list cannot be empty".to_string(),
                    ));
                }
                query = query.filter(user::Column::Id.is_in(ids.clone()));
            }
        }

        let targets = query.all(&self.db).await?;

        let txn = self.db.begin().await?;
        let mut count = 0u64;
        for target in &targets {
            Self::insert_on(
                &txn,
                target.id,
                &sender.organization,
                NotificationKind::Broadcast,
                title,
                message,
                None,
            )
            .await?;
            count += 1;
        }
        txn.commit().await?;

        for target in &targets {
            self.publish(target.id);
        }

        tracing::info!(
            "Broadcast from {} reached {} staff members",
            sender.username,
            count
        );
        Ok(count)
    }

    /// Get unread notification count for a user
    pub async fn unread_count(&self, user_id: i64) -> Result<u64> {
        let count = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Get a newest-first page of a user's notifications
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<notification::Model>> {
        let notifications = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(notifications)
    }

    /// Total notification count for a user
    pub async fn total_count(&self, user_id: i64) -> Result<u64> {
        let count = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Mark a notification as read.
    ///
    /// Marking an already-read notification is a no-op; read never flips
    /// back to unread. An approved role-change response is left unread:
    /// its read flag is the acceptance marker and only flips when the
    /// requester accepts the change.
    pub async fn mark_as_read(&self, notification_id: i64, user_id: i64) -> Result<()> {
        let found = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if found.is_read || found.awaits_role_acceptance() {
            return Ok(());
        }

        let mut active: notification::ActiveModel = found.into();
        active.is_read = Set(true);
        active.update(&self.db).await?;

        self.publish(user_id);
        Ok(())
    }

    /// Mark all of a user's notifications as read.
    ///
    /// Approved role-change responses are skipped; they stay unread until
    /// accepted.
    pub async fn mark_all_as_read(&self, user_id: i64) -> Result<()> {
        notification::Entity::update_many()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .filter(
                notification::Column::Kind.ne(NotificationKind::RoleChangeResponse.as_str()),
            )
            .col_expr(
                notification::Column::IsRead,
                sea_orm::sea_query::Expr::value(true),
            )
            .exec(&self.db)
            .await?;

        // Role-change responses need the payload inspected row by row
        let responses = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .filter(
                notification::Column::Kind.eq(NotificationKind::RoleChangeResponse.as_str()),
            )
            .all(&self.db)
            .await?;
        for row in responses {
            if row.awaits_role_acceptance() {
                continue;
            }
            let mut active: notification::ActiveModel = row.into();
            active.is_read = Set(true);
            active.update(&self.db).await?;
        }

        self.publish(user_id);
        Ok(())
    }

    /// Subscribe to inbox-change events
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }
}
