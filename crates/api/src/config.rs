//! Process configuration, read once at startup and passed down explicitly.

/// Runtime configuration for the API binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub bind_addr: String,
    /// When set, the Postgres store is used; otherwise the in-memory store.
    pub database_url: Option<String>,
    pub token_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let database_url = std::env::var("DATABASE_URL").ok();

        let token_ttl_minutes = std::env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        Self {
            jwt_secret,
            bind_addr,
            database_url,
            token_ttl_minutes,
        }
    }
}
