use std::env;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expire: i64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("APOTHECA_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("APOTHECA_JWT_SECRET not set, using development secret");
            "apotheca-dev-secret-do-not-use-in-production".to_string()
        });

        Self {
            jwt_secret,
            access_token_expire: env::var("APOTHECA_ACCESS_TOKEN_EXPIRE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }
}
