use axum::{Router, routing::get};
use deadpool_diesel::postgres::{Manager as DeadpoolManager, Runtime as DeadpoolRuntime};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use compass_backend::PgPool;
use compass_backend::auth::session_store::DieselSessionStore;
use compass_backend::auth::user_store::Backend as AuthBackend;
use compass_backend::config::Config;
use compass_backend::logging::init_subscriber;
use compass_backend::routes::{
    auth::auth_routes, chats::chat_routes, health::health_check,
    positioning::positioning_routes, profile::profile_routes, tensorzero::tensorzero_routes,
    tools::tool_routes,
};
use compass_backend::state::AppState;

use anyhow::{Context, Result};

use axum_login::AuthManagerLayerBuilder;
use tower_cookies::CookieManagerLayer;
use tower_sessions::{Expiry, SessionManagerLayer, cookie::SameSite};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_subscriber();

    tracing::info!("Starting Compass backend server...");

    let config = Config::load().context("Failed to load configuration")?;
    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set")?;

    tracing::info!("Connecting to database...");
    let manager = DeadpoolManager::new(database_url, DeadpoolRuntime::Tokio1);
    let pool: PgPool = PgPool::builder(manager)
        .runtime(DeadpoolRuntime::Tokio1)
        .build()
        .context("Failed to create DB pool")?;
    tracing::info!("Database connection pool established.");

    run_migrations(&pool).await?;

    // Validate the cookie signing key format early when one is configured.
    if let Some(key) = &config.cookie_signing_key {
        hex::decode(key).context("Invalid COOKIE_SIGNING_KEY format (must be hex)")?;
    }

    // --- Session & Auth Layers ---
    let session_store = DieselSessionStore::new(pool.clone());
    let session_manager_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.session_cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            config.session_ttl_days,
        )));

    let auth_backend = AuthBackend::new(pool.clone());
    let auth_layer = AuthManagerLayerBuilder::new(auth_backend, session_manager_layer).build();

    let port = config.port;
    let app_state = AppState {
        pool: pool.clone(),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", auth_routes())
        .nest("/api/user", profile_routes())
        .nest("/api/ai-tools", tool_routes())
        .nest("/api/chat", chat_routes())
        .nest("/api/brand-positioning", positioning_routes())
        .nest("/api/tensorzero", tensorzero_routes())
        .layer(auth_layer)
        .layer(CookieManagerLayer::new())
        .with_state(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        );

    let addr: SocketAddr = format!("0.0.0.0:{port}")
        .parse()
        .context("Invalid address format")?;

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Attempting to run database migrations...");
    let conn = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get connection for migration: {}", e))?;
    conn.interact(|conn| match conn.run_pending_migrations(MIGRATIONS) {
        Ok(versions) => {
            if versions.is_empty() {
                tracing::info!("No pending migrations found.");
            } else {
                tracing::info!("Successfully ran migrations: {:?}", versions);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            Err(anyhow::anyhow!("Migration diesel error: {:?}", e))
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("Migration interact task failed: {}", e))??;
    Ok(())
}
