use axum::{extract::State, routing::post, Json, Router};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::user;
use crate::services::security::{create_access_token, verify_password};
use crate::state::AppState;

pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username or email address
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub organization: String,
    pub role: String,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            display_name: u.display_name,
            organization: u.organization,
            role: u.role,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    // Find user by username or email
    let found_user = user::Entity::find()
        .filter(
            user::Column::Username
                .eq(&request.username)
                .or(user::Column::Email.eq(&request.username)),
        )
        .one(&state.db)
        .await?;

    let found_user = match found_user {
        Some(u) => u,
        None => {
            let _ = state
                .audit
                .log_failure(
                    AuditAction::LoginFailed,
                    ResourceType::User,
                    Some(request.username.clone()),
                    "Unknown account".to_string(),
                )
                .await;
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    if !found_user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    if !verify_password(&request.password, &found_user.hashed_password) {
        let _ = state
            .audit
            .log_failure(
                AuditAction::LoginFailed,
                ResourceType::User,
                Some(found_user.username.clone()),
                "Wrong password".to_string(),
            )
            .await;
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = create_access_token(&found_user)?;

    let _ = state
        .audit
        .log_success(
            AuditAction::LoginSuccess,
            ResourceType::User,
            Some(found_user.id.to_string()),
            &found_user,
            None,
        )
        .await;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: found_user.into(),
    }))
}
