//! Seed binary: loads the default catalog data.
//!
//! Idempotent; safe to run on every deploy. Also bootstraps the
//! superuser when `ADMIN_USERNAME`/`ADMIN_PASSWORD` are set and the
//! users table is empty.

use anyhow::Context;
use tracing::info;

use budget_office_api::services::seed_service;
use budget_office_api::storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://budget_office.db?mode=rwc".to_string());
    let pool = storage::connect(&database_url)
        .await
        .context("failed to open database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("migration failed")?;

    seed_service::seed_defaults(&pool)
        .await
        .context("seeding default data failed")?;

    if let (Ok(username), Ok(password)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        seed_service::ensure_admin_user(&pool, &username, &password)
            .await
            .context("failed to bootstrap superuser")?;
    }

    info!("seed complete");
    Ok(())
}
