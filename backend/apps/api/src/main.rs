//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors use
//! `kernel::error::AppError` and the per-crate error enums.

use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware,
    routing::get,
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scheduling::{SchedulingConfig, SqliteSchedulingRepository, scheduling_router};
use workspace::application::retention::RetentionSweeper;
use workspace::domain::entity::workspace::{PROTECTED_WORKSPACE_SLUG, Workspace};
use workspace::domain::repository::WorkspaceRepository;
use workspace::domain::value_object::slug::Slug;
use workspace::presentation::middleware::{
    EXPERT_TOKEN_HEADER, MASTER_TOKEN_HEADER, WORKSPACE_TOKEN_HEADER, resolve_workspace,
};
use workspace::{
    AuditLogger, SqliteRateLimitStore, SqliteWorkspaceRepository, WorkspaceConfig, master_router,
    workspace_request_router, workspace_router,
};

// Re-export unified error types for use in handlers
pub use kernel::error::app_error::AppError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,workspace=info,scheduling=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://experts.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations").run(&pool).await?;

    tracing::info!("Migrations completed");

    // Token secret
    let token_secret: Vec<u8> = match env::var("TOKEN_SECRET") {
        Ok(secret) => secret.into_bytes(),
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("TOKEN_SECRET not set; using a random development secret");
            platform::crypto::random_bytes(32)
        }
        Err(_) => anyhow::bail!("TOKEN_SECRET must be set in production"),
    };

    // Workspace configuration
    let mut workspace_config = WorkspaceConfig::new(token_secret.clone());
    if let Ok(master_password) = env::var("MASTER_PASSWORD") {
        workspace_config = workspace_config.with_master_password(master_password);
    } else {
        tracing::warn!("MASTER_PASSWORD not set; master auth is disabled");
    }
    workspace_config.retention_years = RetentionSweeper::<SqliteWorkspaceRepository>::parse_years(
        env::var("RETENTION_YEARS").ok().as_deref(),
    );
    let workspace_config = Arc::new(workspace_config);

    let scheduling_config = Arc::new(SchedulingConfig::new(token_secret));

    // Shared infrastructure
    let workspace_repo = SqliteWorkspaceRepository::new(pool.clone());
    let scheduling_repo = SqliteSchedulingRepository::new(pool.clone());
    let limiter = SqliteRateLimitStore::new(pool.clone());
    let audit = AuditLogger::new(pool.clone());

    // Seed the protected default workspace
    seed_default_workspace(&workspace_repo).await?;

    // Startup cleanup: drop stale rate-limit rows
    // Errors here should not prevent server startup
    match limiter.purge_stale(Duration::from_secs(24 * 3600)).await {
        Ok(purged) => {
            tracing::info!(rate_limits_purged = purged, "Rate limit cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rate limit cleanup failed, continuing anyway");
        }
    }

    // Periodic retention sweep
    spawn_retention_sweeper(pool.clone(), workspace_config.retention_years);

    // Handler states
    let workspace_state = workspace::presentation::router::app_state(
        workspace_repo.clone(),
        limiter.clone(),
        workspace_config.clone(),
        audit.clone(),
    );
    let guard = workspace::presentation::router::guard_state(&workspace_state);
    let scheduling_state = scheduling::presentation::router::app_state(
        scheduling_repo,
        limiter,
        scheduling_config,
        audit,
    );

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            http::HeaderName::from_static(MASTER_TOKEN_HEADER),
            http::HeaderName::from_static(WORKSPACE_TOKEN_HEADER),
            http::HeaderName::from_static(EXPERT_TOKEN_HEADER),
        ]))
        .allow_credentials(true);

    // Tenant-scoped routes: workspace + scheduling behind slug resolution
    let workspace_scope = workspace_router(workspace_state.clone())
        .merge(scheduling_router(scheduling_state))
        .layer(middleware::from_fn_with_state(
            guard,
            resolve_workspace::<SqliteWorkspaceRepository>,
        ));

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/master", master_router(workspace_state.clone()))
        .nest(
            "/api/workspace-requests",
            workspace_request_router(workspace_state),
        )
        .nest("/api/workspaces/{slug}", workspace_scope)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3001".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> AppError {
    AppError::not_found("Not Found")
}

/// Ensure the protected default workspace exists
async fn seed_default_workspace(repo: &SqliteWorkspaceRepository) -> anyhow::Result<()> {
    if repo.exists_by_slug(PROTECTED_WORKSPACE_SLUG).await? {
        return Ok(());
    }

    let password =
        env::var("DEFAULT_WORKSPACE_PASSWORD").unwrap_or_else(|_| "0000".to_string());
    let slug = Slug::new(PROTECTED_WORKSPACE_SLUG)
        .map_err(|e| anyhow::anyhow!("Invalid protected slug: {e}"))?;

    let workspace = Workspace::new(
        "Default Workspace",
        slug,
        platform::password::hash_password(&password),
    );
    repo.create(&workspace).await?;

    tracing::info!("Seeded protected default workspace");
    Ok(())
}

/// Spawn the periodic retention sweep. The first tick fires immediately,
/// doubling as startup maintenance.
fn spawn_retention_sweeper(pool: SqlitePool, years: u32) {
    let sweep_hours: u64 = env::var("RETENTION_SWEEP_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&h| h > 0)
        .unwrap_or(24);

    tokio::spawn(async move {
        let sweeper = RetentionSweeper::new(Arc::new(SqliteWorkspaceRepository::new(pool)), years);
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_hours * 3600));

        loop {
            interval.tick().await;
            if let Err(e) = sweeper.run().await {
                tracing::error!(error = %e, "Retention sweep failed");
            }
        }
    });
}
