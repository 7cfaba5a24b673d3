pub mod audit;
pub mod auth;
pub mod notifications;
pub mod role_requests;
pub mod staff;

use axum::{middleware as axum_middleware, routing::get, Json, Router};

use crate::config::CONFIG;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .nest("/auth", auth::auth_routes(state.clone()));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .nest("/api", api_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}

/// API routes under /api/* (protected by auth middleware)
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/me", get(staff::get_me))
        .nest("/staff", staff::staff_routes(state.clone()))
        .nest(
            "/role-requests",
            role_requests::role_requests_routes(state.clone()),
        )
        .nest(
            "/notifications",
            notifications::notifications_routes(state.clone()),
        )
        .nest("/audit", audit::audit_routes(state))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": CONFIG.version,
    }))
}
