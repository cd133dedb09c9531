//! Postgres connection pool and schema bootstrap.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Connection settings for the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a pool against `settings.url`. Fails fast if the first connection
/// cannot be established.
pub async fn connect(settings: &DbSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.url)
        .await?;

    info!(max_connections = settings.max_connections, "postgres pool ready");
    Ok(pool)
}

/// Create every table and index the service needs if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    info!("database schema ensured");
    Ok(())
}
