use jetway_core::repository::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    /// Connections are checked out per query or transaction and go back to
    /// the pool when dropped.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps a sqlx failure onto the store error taxonomy.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unknown").to_string();
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(constraint);
        }
    }
    error!("Database error: {}", err);
    StoreError::Unavailable(err.to_string())
}

/// SQLSTATE 40P01 (deadlock_detected) and 40001 (serialization_failure).
pub(crate) fn is_lock_conflict_code(code: &str) -> bool {
    matches!(code, "40P01" | "40001")
}

/// True when Postgres aborted the statement because it lost a lock race
/// with another transaction.
pub(crate) fn is_lock_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| is_lock_conflict_code(&code)),
        _ => false,
    }
}

/// A stored value that no longer parses into its domain type.
pub(crate) fn corrupt(what: &str, value: &str) -> StoreError {
    error!("Corrupt {} in database: {}", what, value);
    StoreError::Unavailable(format!("corrupt {} '{}'", what, value))
}
