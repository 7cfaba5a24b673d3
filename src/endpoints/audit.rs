use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::permissions::{AuditView, Authorized};
use crate::services::audit::{get_audit_logs, AuditPage};
use crate::state::AppState;

pub fn audit_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_audit_logs))
        .with_state(state)
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AuditQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/audit",
    tag = "Audit",
    params(
        ("limit" = Option<u64>, Query, description = "Number of entries to return"),
        ("offset" = Option<u64>, Query, description = "Offset for pagination"),
    ),
    responses(
        (status = 200, body = AuditPage),
        (status = 403, description = "audit.view required")
    )
)]
async fn list_audit_logs(
    State(state): State<AppState>,
    caller: Authorized<AuditView>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditPage>> {
    let limit = query.limit.unwrap_or(50).min(200);
    let offset = query.offset.unwrap_or(0);

    let page = get_audit_logs(&state.db, &caller.user().organization, limit, offset).await?;
    Ok(Json(page))
}
