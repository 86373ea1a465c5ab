//! Default data seeding.
//!
//! Loads the stock departments, currencies, transaction types,
//! transaction statuses and bill categories. Every loader is
//! idempotent (get-or-create), so the seed can run on every deploy.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::password_service;

/// Statuses that close their records for further editing.
const CLOSING_STATUSES: &[&str] = &["Aprobado"];

/// Seed all default catalog data.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_departments(pool).await?;
    seed_currencies(pool).await?;
    seed_transaction_types(pool).await?;
    seed_transaction_statuses(pool).await?;
    seed_bill_categories(pool).await?;
    Ok(())
}

/// Create the bootstrap superuser when the users table is empty.
///
/// Returns whether a user was created.
pub async fn ensure_admin_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> anyhow::Result<bool> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count > 0 {
        return Ok(false);
    }

    let hash = password_service::hash_password(password)
        .map_err(|e| anyhow::anyhow!("failed to hash bootstrap password: {}", e))?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, is_superuser, is_active, created_at, updated_at)
        VALUES (?, '', ?, 1, 1, ?, ?)
        "#,
    )
    .bind(username)
    .bind(hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    info!("bootstrap superuser '{}' created", username);
    Ok(true)
}

async fn seed_departments(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let departments = ["WOM", "ENTEL", "MOVISTAR", "GALPON"];

    for name in departments {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM departments WHERE name = ?)")
                .bind(name)
                .fetch_one(pool)
                .await?;

        if exists {
            continue;
        }

        let now = Utc::now();
        sqlx::query("INSERT INTO departments (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await?;
        info!("department '{}' created", name);
    }

    Ok(())
}

async fn seed_currencies(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let currencies = [
        ("Chilean Peso", "CLP", "$"),
        ("US Dollar", "USD", "$"),
        ("Euro", "EUR", "€"),
    ];

    for (name, code, symbol) in currencies {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM currencies WHERE code = ?)")
                .bind(code)
                .fetch_one(pool)
                .await?;

        if exists {
            continue;
        }

        sqlx::query("INSERT INTO currencies (name, code, symbol) VALUES (?, ?, ?)")
            .bind(name)
            .bind(code)
            .bind(symbol)
            .execute(pool)
            .await?;
        info!("currency '{}' created", name);
    }

    Ok(())
}

async fn seed_transaction_types(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let types = [
        "Transferencia Bancaria",
        "Efectivo",
        "Orden de Pago",
        "Debito/Credito",
    ];

    for name in types {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM transaction_types WHERE name = ?)")
                .bind(name)
                .fetch_one(pool)
                .await?;

        if exists {
            continue;
        }

        let now = Utc::now();
        sqlx::query("INSERT INTO transaction_types (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await?;
        info!("transaction type '{}' created", name);
    }

    Ok(())
}

async fn seed_transaction_statuses(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statuses = ["Aprobado", "En espera", "Rechazado"];

    for name in statuses {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM transaction_statuses WHERE name = ?)")
                .bind(name)
                .fetch_one(pool)
                .await?;

        if exists {
            continue;
        }

        let closes = CLOSING_STATUSES.contains(&name);
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO transaction_statuses (name, closes_records, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(closes)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
        info!("transaction status '{}' created", name);
    }

    Ok(())
}

async fn seed_bill_categories(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let categories = [
        (
            "Servicio",
            "Gastos relacionados con servicios como electricidad, agua, internet, etc.",
        ),
        (
            "Suministro",
            "Gastos en materiales y suministros necesarios para las operaciones diarias.",
        ),
        (
            "Personal",
            "Gastos asociados al personal, incluyendo salarios, beneficios y formación.",
        ),
        (
            "Mantenimiento",
            "Gastos para el mantenimiento y reparación de equipos e instalaciones.",
        ),
        (
            "Marketing",
            "Gastos relacionados con publicidad, promociones y actividades de marketing.",
        ),
        (
            "Viajes",
            "Gastos de transporte, alojamiento y dietas durante viajes de negocios.",
        ),
        (
            "Tecnología",
            "Gastos en software, hardware y servicios tecnológicos.",
        ),
        (
            "Consultoría",
            "Gastos en servicios de consultoría externa y asesoramiento profesional.",
        ),
        (
            "Impuesto",
            "Gastos relacionados con impuestos y tasas gubernamentales.",
        ),
        (
            "Otros",
            "Cualquier otro gasto que no encaje en las categorías anteriores.",
        ),
    ];

    for (name, description) in categories {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bill_categories WHERE name = ?)")
                .bind(name)
                .fetch_one(pool)
                .await?;

        if exists {
            continue;
        }

        sqlx::query("INSERT INTO bill_categories (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(pool)
            .await?;
        info!("bill category '{}' created", name);
    }

    Ok(())
}
