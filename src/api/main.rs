//! API server binary.
//!
//! Boots the tracing subscriber, opens the database, runs migrations,
//! bootstraps the superuser and serves the API with graceful shutdown.

use anyhow::Context;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use budget_office_api::middleware::cors::create_cors_layer;
use budget_office_api::routes::{self, AppState};
use budget_office_api::services::seed_service;
use budget_office_api::storage;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG controls the log level (default: info)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("application starting");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://budget_office.db?mode=rwc".to_string());
    let pool = storage::connect(&database_url)
        .await
        .context("failed to open database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("migration failed")?;

    // Bootstrap superuser on an empty users table.
    if let (Ok(username), Ok(password)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        seed_service::ensure_admin_user(&pool, &username, &password)
            .await
            .context("failed to bootstrap superuser")?;
    }

    let upload_root =
        PathBuf::from(std::env::var("UPLOAD_DATA").unwrap_or_else(|_| "media".to_string()));
    info!("storing attachments under {:?}", upload_root);

    let app_state = AppState::new(pool.clone(), upload_root);

    tokio::spawn(storage::session_store::start_session_cleanup_task(pool));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/health", get(health_check))
        .nest("/api/v1", routes::create_api_router(app_state.clone()))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer()),
        );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8081);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("server listening on {}", addr);
    info!("health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shutdown complete");
    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "budget-office-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Resolve on SIGINT (Ctrl+C) or SIGTERM (container stop).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT received, shutting down gracefully");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down gracefully");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        info!("shutdown signal received");
    }
}
