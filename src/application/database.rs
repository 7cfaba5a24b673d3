use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::CONFIG;
use crate::error::Result;
use crate::migrations::Migrator;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Connect to the configured database and run pending migrations
pub async fn connect_and_migrate() -> Result<DbConn> {
    let mut options = ConnectOptions::new(CONFIG.database.url.clone());
    options
        .max_connections(CONFIG.database.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;

    tracing::info!("Running database migrations");
    Migrator::up(&db, None).await?;

    Ok(db)
}
