//! CampusNest application composition root
//!
//! Builds the message store selected by configuration and composes the
//! messaging router with shared infrastructure routes.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use campusnest_auth::{AuthBackend, AuthConfig};
use campusnest_common::{Config, LogFormat, MessageStoreKind};
use campusnest_messaging::{InMemoryMessageStore, MessageRepository, MessageStore, MessagingState};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

/// Request bodies above this size are rejected before JSON parsing
const MAX_BODY_BYTES: usize = 64 * 1024;

const MAX_DB_CONNECTIONS: u32 = 10;

/// Install the global tracing subscriber in the configured format
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Connect to Postgres and apply pending migrations
pub async fn connect_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Build the message store selected by `MESSAGE_STORE`
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn MessageStore>> {
    match config.message_store {
        MessageStoreKind::Postgres => {
            let pool = connect_database(config).await?;
            Ok(Arc::new(MessageRepository::new(pool)))
        }
        MessageStoreKind::Memory => {
            tracing::warn!("Using in-memory message store; messages are lost on restart");
            Ok(Arc::new(InMemoryMessageStore::new()))
        }
    }
}

/// Create the main application router with all routes
pub fn create_app(config: &Config, store: Arc<dyn MessageStore>) -> Router {
    let auth = AuthBackend::new(AuthConfig::from(config));
    let messaging_state = MessagingState::new(store, auth);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "CampusNest Messaging API v0.0.1-SNAPSHOT" }),
        )
        .merge(campusnest_messaging::routes().with_state(messaging_state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
