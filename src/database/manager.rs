use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the record stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("record not found")]
    NotFound,

    #[error("edit conflict")]
    EditConflict,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("store call timed out")]
    Timeout,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the PostgreSQL pool backing the sqlx stores
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(Duration::from_secs(config.max_idle_time_secs))
            .acquire_timeout(config.query_timeout())
            .connect(url)
            .await?;

        // Fail at startup rather than on the first request
        tokio::time::timeout(config.query_timeout(), sqlx::query("SELECT 1").execute(&pool))
            .await
            .map_err(|_| StoreError::Timeout)??;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_requires_url() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            max_idle_time_secs: 1,
            query_timeout_secs: 1,
        };
        assert!(matches!(
            DatabaseManager::connect(&config).await,
            Err(StoreError::ConfigMissing("DATABASE_URL"))
        ));
    }
}
