pub mod models;
pub mod store;

pub use store::{DocumentStore, MemoryDocumentStore, PgDocumentStore, StoreError};

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Fixed identity of the one document row.
pub const DOCUMENT_ID: i32 = 1;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    /// Builds the pool settings from `DATABASE_URL` and the `DB_*` knobs.
    /// Returns `None` when no database is configured.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty())?;

        Some(Self {
            url,
            max_connections: parsed(&lookup, "DB_POOL_MAX", 10),
            min_connections: parsed(&lookup, "DB_POOL_MIN", 1),
            connect_timeout_secs: parsed(&lookup, "DB_CONNECT_TIMEOUT", 10),
            idle_timeout_secs: parsed(&lookup, "DB_IDLE_TIMEOUT", 300),
        })
    }

    /// Connection string with everything but the URL skeleton masked.
    pub fn redacted_url(&self) -> String {
        self.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*",
        )
    }
}

/// `key` parsed as `T`; out-of-range and malformed values fall back to `default`.
fn parsed<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!("Database URL: {}", config.redacted_url());

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> Result<Duration, sqlx::Error> {
    let start = std::time::Instant::now();
    sqlx::query("SELECT 1").fetch_one(pool).await?;

    Ok(start.elapsed())
}

/// Creates the `site_data` table. Safe to run on every boot.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS site_data (
            id INTEGER PRIMARY KEY,
            data JSONB NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await?;

    // Tables created by earlier deployments lack the timestamp column.
    sqlx::query(
        r#"
        ALTER TABLE site_data
            ADD COLUMN IF NOT EXISTS updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
