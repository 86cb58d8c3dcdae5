//! Database connection pool, migrations, and health check.
//!
//! Shared Postgres connection pool behind the record store adapter.
//! Every snapshot is validated at this boundary before it reaches the
//! differ.

pub mod records;

use crate::error::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Record store handle. Owns the connection pool.
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::Error::Other(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Simple health check — run a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool (for the NOTIFY listener).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
