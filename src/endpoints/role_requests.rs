use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::permissions::{Authenticated, Authorized, RequestsResolve};
use crate::models::role_change_request;
use crate::models::staff_role::StaffRole;
use crate::services::workflow::Decision;
use crate::state::AppState;

pub fn role_requests_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_requests).post(submit_request))
        .route("/{id}/resolve", post(resolve_request))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SubmitRequestPayload {
    /// Target role; must differ from the caller's current role
    pub to_role: String,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ResolveRequestPayload {
    pub decision: Decision,
    #[validate(length(max = 1000))]
    pub admin_response: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RoleRequestDto {
    pub id: i64,
    pub user_id: i64,
    pub from_role: String,
    pub to_role: String,
    pub status: String,
    pub requested_by_name: String,
    pub requested_by_email: String,
    pub reason: Option<String>,
    pub admin_response: Option<String>,
    pub created_at: String,
    pub processed_at: Option<String>,
    pub processed_by: Option<i64>,
}

impl From<role_change_request::Model> for RoleRequestDto {
    fn from(r: role_change_request::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            from_role: r.from_role,
            to_role: r.to_role,
            status: r.status,
            requested_by_name: r.requested_by_name,
            requested_by_email: r.requested_by_email,
            reason: r.reason,
            admin_response: r.admin_response,
            created_at: r.created_at.to_rfc3339(),
            processed_at: r.processed_at.map(|t| t.to_rfc3339()),
            processed_by: r.processed_by,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    post,
    path = "/api/role-requests",
    tag = "Role requests",
    request_body = SubmitRequestPayload,
    responses(
        (status = 201, body = RoleRequestDto),
        (status = 400, description = "Unknown or unchanged target role")
    )
)]
async fn submit_request(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Json(payload): Json<SubmitRequestPayload>,
) -> Result<(StatusCode, Json<RoleRequestDto>)> {
    payload.validate()?;

    let to_role = StaffRole::parse(&payload.to_role)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown role: {}", payload.to_role)))?;

    let created = state
        .workflow
        .submit(&caller, to_role, payload.reason)
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List role change requests of the caller's organization, newest first.
///
/// Non-administrators receive an empty list rather than an error.
#[utoipa::path(
    get,
    path = "/api/role-requests",
    tag = "Role requests",
    responses(
        (status = 200, body = Vec<RoleRequestDto>)
    )
)]
async fn list_requests(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<RoleRequestDto>>> {
    let requests = state.workflow.list_for(&caller).await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/role-requests/{id}/resolve",
    tag = "Role requests",
    request_body = ResolveRequestPayload,
    params(
        ("id" = i64, Path, description = "Request id"),
    ),
    responses(
        (status = 200, body = RoleRequestDto),
        (status = 404, description = "Request not found in the caller's organization"),
        (status = 409, description = "Request already processed")
    )
)]
async fn resolve_request(
    State(state): State<AppState>,
    admin: Authorized<RequestsResolve>,
    Path(id): Path<i64>,
    Json(payload): Json<ResolveRequestPayload>,
) -> Result<Json<RoleRequestDto>> {
    payload.validate()?;

    let resolved = state
        .workflow
        .resolve(admin.user(), id, payload.decision, payload.admin_response)
        .await?;

    Ok(Json(resolved.into()))
}
