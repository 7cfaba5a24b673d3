use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::middleware::permissions::{Authenticated, Authorized, NotificationsSend};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::notification;
use crate::services::notification::BroadcastRecipients;
use crate::state::AppState;

pub fn notifications_routes(state: AppState) -> Router {
    Router::new()
        // User inbox
        .route("/inbox", get(get_inbox))
        .route("/inbox/count", get(get_unread_count))
        .route("/inbox/ws", get(ws_handler))
        .route("/inbox/read-all", post(mark_all_as_read))
        .route("/inbox/{id}/read", post(mark_as_read))
        .route("/inbox/{id}/accept-role", post(accept_role_change))
        // Dispatch (managers and administrators)
        .route("/message", post(send_direct_message))
        .route("/broadcast", post(send_broadcast))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize, utoipa::ToSchema)]
pub struct InboxResponse {
    pub notifications: Vec<NotificationDto>,
    pub total: u64,
    pub unread: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationDto {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    /// Structured payload, present for role-change responses
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationDto {
    fn from(n: notification::Model) -> Self {
        let data = n
            .data
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());
        Self {
            id: n.id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            data,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct InboxQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct DirectMessagePayload {
    pub recipient_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct BroadcastPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub recipients: BroadcastRecipients,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BroadcastResponse {
    /// Number of staff members the broadcast was delivered to
    pub sent: u64,
}

// ============================================================================
// User Inbox Endpoints
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/notifications/inbox",
    tag = "Notifications",
    params(
        ("limit" = Option<u64>, Query, description = "Number of notifications to return"),
        ("offset" = Option<u64>, Query, description = "Offset for pagination"),
    ),
    responses(
        (status = 200, body = InboxResponse)
    )
)]
async fn get_inbox(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Query(query): Query<InboxQuery>,
) -> Result<Json<InboxResponse>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.offset.unwrap_or(0);

    let notifications = state
        .notification
        .list_for_user(caller.id, limit, offset)
        .await?;
    let unread = state.notification.unread_count(caller.id).await?;
    let total = state.notification.total_count(caller.id).await?;

    Ok(Json(InboxResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        total,
        unread,
    }))
}

#[utoipa::path(
    get,
    path = "/api/notifications/inbox/count",
    tag = "Notifications",
    responses(
        (status = 200, body = UnreadCountResponse)
    )
)]
async fn get_unread_count(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<UnreadCountResponse>> {
    let count = state.notification.unread_count(caller.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/inbox/{id}/read",
    tag = "Notifications",
    params(
        ("id" = i64, Path, description = "Notification id"),
    ),
    responses(
        (status = 204),
        (status = 404, description = "Notification not found")
    )
)]
async fn mark_as_read(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode> {
    state.notification.mark_as_read(id, caller.id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/notifications/inbox/read-all",
    tag = "Notifications",
    responses(
        (status = 204)
    )
)]
async fn mark_all_as_read(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<axum::http::StatusCode> {
    state.notification.mark_all_as_read(caller.id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Adopt an approved role change.
///
/// This is the only way a live role changes; approval alone never mutates
/// the account.
#[utoipa::path(
    post,
    path = "/api/notifications/inbox/{id}/accept-role",
    tag = "Notifications",
    params(
        ("id" = i64, Path, description = "Notification id"),
    ),
    responses(
        (status = 204, description = "Role adopted; clients should refresh cached authorization state"),
        (status = 400, description = "Notification is not an approved role change"),
        (status = 404, description = "Notification not found")
    )
)]
async fn accept_role_change(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode> {
    state.workflow.accept(&caller, id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

// ============================================================================
// Dispatch Endpoints
// ============================================================================

#[utoipa::path(
    post,
    path = "/api/notifications/message",
    tag = "Notifications",
    request_body = DirectMessagePayload,
    responses(
        (status = 201, body = NotificationDto),
        (status = 403, description = "notifications.send required"),
        (status = 404, description = "Recipient not found in the sender's organization")
    )
)]
async fn send_direct_message(
    State(state): State<AppState>,
    sender: Authorized<NotificationsSend>,
    Json(payload): Json<DirectMessagePayload>,
) -> Result<(axum::http::StatusCode, Json<NotificationDto>)> {
    payload.validate()?;

    let row = state
        .notification
        .send_direct_message(
            sender.user(),
            payload.recipient_id,
            &payload.title,
            &payload.message,
        )
        .await?;

    if let Err(e) = state
        .audit
        .log_success(
            AuditAction::DirectMessageSent,
            ResourceType::Notification,
            Some(row.id.to_string()),
            sender.user(),
            Some(serde_json::json!({ "recipient_id": payload.recipient_id })),
        )
        .await
    {
        tracing::warn!("Failed to audit direct message: {}", e);
    }

    Ok((axum::http::StatusCode::CREATED, Json(row.into())))
}

#[utoipa::path(
    post,
    path = "/api/notifications/broadcast",
    tag = "Notifications",
    request_body = BroadcastPayload,
    responses(
        (status = 200, body = BroadcastResponse),
        (status = 400, description = "Empty explicit recipient set"),
        (status = 403, description = "notifications.send required")
    )
)]
async fn send_broadcast(
    State(state): State<AppState>,
    sender: Authorized<NotificationsSend>,
    Json(payload): Json<BroadcastPayload>,
) -> Result<Json<BroadcastResponse>> {
    payload.validate()?;

    let sent = state
        .notification
        .send_broadcast(
            sender.user(),
            &payload.title,
            &payload.message,
            payload.recipients,
        )
        .await?;

    if let Err(e) = state
        .audit
        .log_success(
            AuditAction::BroadcastSent,
            ResourceType::Notification,
            None,
            sender.user(),
            Some(serde_json::json!({ "sent": sent })),
        )
        .await
    {
        tracing::warn!("Failed to audit broadcast: {}", e);
    }

    Ok(Json(BroadcastResponse { sent }))
}

// ============================================================================
// WebSocket Handler
// ============================================================================

#[derive(Debug, Serialize)]
struct UnreadCountMessage {
    #[serde(rename = "type")]
    msg_type: &'static str,
    count: u64,
}

impl UnreadCountMessage {
    fn new(count: u64) -> Self {
        Self {
            msg_type: "unread_count",
            count,
        }
    }
}

/// WebSocket upgrade handler for live unread-count updates
async fn ws_handler(
    ws: WebSocketUpgrade,
    Authenticated(caller): Authenticated,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, caller.id))
}

/// Handle one WebSocket connection.
///
/// The initial count is always fetched fresh: the event channel only
/// carries deltas after the subscribe point, so a reconnecting client must
/// not rely on it for history.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: i64) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the initial fetch so no event is lost in between
    let mut rx = state.events_tx.subscribe();

    let initial = state.notification.unread_count(user_id).await.unwrap_or(0);
    let initial_json = serde_json::to_string(&UnreadCountMessage::new(initial))
        .unwrap_or_else(|_| String::from("{}"));
    if sender.send(Message::Text(initial_json.into())).await.is_err() {
        return;
    }

    let send_state = state.clone();
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.user_id == user_id => {
                    let count = send_state
                        .notification
                        .unread_count(user_id)
                        .await
                        .unwrap_or(0);
                    let json = match serde_json::to_string(&UnreadCountMessage::new(count)) {
                        Ok(j) => j,
                        Err(_) => continue,
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {} // Someone else's inbox
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    // Dropped events collapse into one fresh count
                    debug!("Unread-count subscriber lagged by {} events", n);
                    let count = send_state
                        .notification
                        .unread_count(user_id)
                        .await
                        .unwrap_or(0);
                    if let Ok(json) = serde_json::to_string(&UnreadCountMessage::new(count)) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("WebSocket client requested close");
                    break;
                }
                Err(e) => {
                    debug!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    debug!("Unread-count subscriber for user {} disconnected", user_id);
}
