pub use sea_orm_migration::prelude::*;

mod m20260815_000001_create_users;
mod m20260815_000002_create_role_change_requests;
mod m20260815_000003_create_notifications;
mod m20260815_000004_create_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260815_000001_create_users::Migration),
            Box::new(m20260815_000002_create_role_change_requests::Migration),
            Box::new(m20260815_000003_create_notifications::Migration),
            Box::new(m20260815_000004_create_audit_logs::Migration),
        ]
    }
}
