use tokio::sync::broadcast;

use crate::db::DbConn;
use crate::services::{AuditService, NotificationEvent, NotificationService, RoleChangeService};

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub audit: AuditService,
    pub notification: NotificationService,
    pub workflow: RoleChangeService,
    /// Inbox-change events feeding the WebSocket unread-count projection
    pub events_tx: broadcast::Sender<NotificationEvent>,
}

impl AppState {
    pub fn new(db: DbConn) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        let audit = AuditService::new(db.clone());
        let notification = NotificationService::new(db.clone(), events_tx.clone());
        let workflow = RoleChangeService::new(db.clone(), notification.clone(), audit.clone());

        Self {
            db,
            audit,
            notification,
            workflow,
            events_tx,
        }
    }
}
