use axum::{extract::State, routing::get, Json, Router};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::endpoints::auth::UserInfo;
use crate::error::Result;
use crate::middleware::permissions::{Authenticated, Authorized, StaffView};
use crate::models::user;
use crate::state::AppState;

pub fn staff_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_staff))
        .with_state(state)
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StaffListResponse {
    pub staff: Vec<UserInfo>,
}

/// List active staff of the caller's organization.
///
/// Used by managers and administrators to pick message and broadcast
/// recipients.
#[utoipa::path(
    get,
    path = "/api/staff",
    tag = "Staff",
    responses(
        (status = 200, body = StaffListResponse),
        (status = 403, description = "staff.view required")
    )
)]
async fn list_staff(
    State(state): State<AppState>,
    caller: Authorized<StaffView>,
) -> Result<Json<StaffListResponse>> {
    let staff = user::Entity::find()
        .filter(user::Column::Organization.eq(&caller.user().organization))
        .filter(user::Column::IsActive.eq(true))
        .order_by_asc(user::Column::Username)
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserInfo::from)
        .collect();

    Ok(Json(StaffListResponse { staff }))
}

/// The authenticated caller's own profile
pub async fn get_me(Authenticated(caller): Authenticated) -> Json<UserInfo> {
    Json(caller.into())
}
