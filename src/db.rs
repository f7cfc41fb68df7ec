use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the human name of the field.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Maps a sqlx error, turning unique violations into `StoreError::Duplicate(field)`.
pub(crate) fn map_sqlx(e: sqlx::Error, field: &'static str, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Backend(anyhow::Error::new(e).context(what))
}

pub(crate) fn backend(e: sqlx::Error, what: &'static str) -> StoreError {
    StoreError::Backend(anyhow::Error::new(e).context(what))
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}
