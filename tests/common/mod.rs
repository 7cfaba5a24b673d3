//! Shared helpers for integration tests.
//!
//! Tests drive the real router with `tower::ServiceExt::oneshot` over an
//! in-memory SQLite database; no network listener is involved.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tower::util::ServiceExt;

use apotheca::endpoints::create_router;
use apotheca::migrations::Migrator;
use apotheca::models::staff_role::StaffRole;
use apotheca::models::user;
use apotheca::services::security::hash_password;
use apotheca::state::AppState;

pub const TEST_PASSWORD: &str = "password123";

/// Create an in-memory SQLite database with migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Build the application router and state over the given database
pub fn build_app(db: DatabaseConnection) -> (Router, AppState) {
    let state = AppState::new(db);
    (create_router(state.clone()), state)
}

/// Create an active staff account with [`TEST_PASSWORD`]
pub async fn create_staff(
    db: &DatabaseConnection,
    username: &str,
    organization: &str,
    role: StaffRole,
) -> user::Model {
    let now = chrono::Utc::now();
    let account = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@{}.example.com", username, organization)),
        hashed_password: Set(hash_password(TEST_PASSWORD).unwrap()),
        display_name: Set(username.to_string()),
        organization: Set(organization.to_string()),
        role: Set(role.as_str().to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    account.insert(db).await.expect("Failed to insert test user")
}

/// POST /auth/login and return the access token
pub async fn login(app: &Router, username: &str) -> String {
    let (status, body) = request_json(
        app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({
            "username": username,
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"]
        .as_str()
        .expect("login response carries no access_token")
        .to_string()
}

/// Issue a request and return (status, parsed JSON body).
///
/// An empty response body parses as JSON null.
pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    json_body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match json_body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}
