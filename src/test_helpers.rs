//! Test helpers for in-crate unit tests.

#![allow(dead_code)]

use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;
use crate::models::staff_role::StaffRole;
use crate::models::user;
use crate::services::security::hash_password;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    // Each connection gets its own database
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Create an active staff account with password "password123"
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    organization: &str,
    role: StaffRole,
) -> user::Model {
    let now = chrono::Utc::now();
    let account = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@{}.example.com", username, organization)),
        hashed_password: Set(hash_password("password123").unwrap()),
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
