use std::env;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL; Postgres in deployments, SQLite for local development.
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("APOTHECA_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://apotheca.db?mode=rwc".to_string()),
            max_connections: env::var("APOTHECA_DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}
