use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::config;
use crate::database::repository::StoreError;

/// Connect to the database named by DATABASE_URL with configured pool
/// settings and run any pending migrations.
pub async fn connect() -> Result<PgPool, StoreError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| StoreError::Other("DATABASE_URL is not set".to_string()))?;

    let db = config::config().database.clone();
    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .acquire_timeout(Duration::from_secs(db.connection_timeout_secs))
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Other(format!("migration failed: {e}")))?;

    info!("database pool ready");
    Ok(pool)
}

/// Ping the database to confirm connectivity.
pub async fn health_check(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
