mod http;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

use matchtv_core::playback::HttpEngineFactory;
use matchtv_core::presence::{LocalPresence, PresenceChannel, RedisPresence};
use matchtv_core::repository::PgCatalogRepository;
use matchtv_core::service::{AuthService, CatalogService, SessionService};
use matchtv_core::{logging, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional config file path as the first argument; env vars override.
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}");
        eprintln!("Using default configuration");
        Config::default()
    });

    logging::init_logging(&config.logging)?;

    info!("MatchTV API server starting...");
    info!("HTTP address: {}", config.http_address());

    info!("Connecting to database...");
    let pool: sqlx::PgPool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_seconds))
        .connect(config.database_url())
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            anyhow::anyhow!("Database connection failed: {e}")
        })?;
    info!("Database connected successfully");

    info!("Running database migrations...");
    sqlx::migrate!("../migrations").run(&pool).await.map_err(|e| {
        error!("Failed to run migrations: {e}");
        anyhow::anyhow!("Migration failed: {e}")
    })?;
    info!("Migrations completed");

    let presence: Arc<dyn PresenceChannel> = if config.redis.url.is_empty() {
        info!("Redis URL not configured, using in-process presence");
        Arc::new(LocalPresence::new())
    } else {
        match RedisPresence::connect(&config.redis.url, &config.redis.key_prefix).await {
            Ok(presence) => {
                info!("Redis presence channel connected");
                Arc::new(presence)
            }
            Err(e) => {
                error!("Failed to connect Redis presence: {e}");
                error!("Continuing with in-process presence");
                Arc::new(LocalPresence::new())
            }
        }
    };

    let auth = Arc::new(AuthService::new(&config.auth).map_err(|e| {
        error!("Auth configuration invalid: {e}");
        error!("Set MATCHTV_AUTH__JWT_SECRET and MATCHTV_AUTH__ADMIN_PASSWORD_HASH");
        anyhow::anyhow!("Auth configuration invalid: {e}")
    })?);
    if config.auth.admin_password_hash.is_empty() {
        warn!("No admin password hash configured; admin login will always fail");
    }

    let catalog_repo = Arc::new(PgCatalogRepository::new(pool));
    let catalog = Arc::new(CatalogService::new(catalog_repo.clone()));
    let engines = Arc::new(HttpEngineFactory::default());
    let sessions = Arc::new(SessionService::new(catalog_repo, presence.clone(), engines));

    let router = http::create_router(catalog, sessions, presence, auth);

    let http_address = config.http_address();
    let listener = tokio::net::TcpListener::bind(&http_address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {http_address}: {e}"))?;
    info!("HTTP server listening on {http_address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}
