use std::sync::Arc;

use sqlx::PgPool;

use trackle_api::app::services::AppServices;
use trackle_api::config::Config;
use trackle_store::{PostgresStore, Storage};

#[tokio::main]
async fn main() {
    trackle_observability::init();

    let config = Config::from_env();

    let storage = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .expect("failed to connect to DATABASE_URL");
            PostgresStore::new(pool.clone())
                .migrate()
                .await
                .expect("failed to run schema migration");
            Storage::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            Storage::in_memory()
        }
    };

    let services = Arc::new(AppServices::new(
        storage,
        &config.jwt_secret,
        config.token_ttl_minutes,
    ));
    let app = trackle_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
