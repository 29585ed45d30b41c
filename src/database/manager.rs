use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// True for Postgres `unique_violation` (SQLSTATE 23505)
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }
}

/// Builds and maintains the Postgres connection pool shared by all handlers
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect eagerly using `DATABASE_URL` and the configured pool settings
    pub async fn connect() -> Result<PgPool, DatabaseError> {
        let url = Self::database_url()?;
        let pool = Self::pool_options().connect(&url).await?;
        info!("Connected to database {}", Self::redacted(&url));
        Ok(pool)
    }

    /// Pool that opens connections on first use; lets the server boot while the database is still starting
    pub fn connect_lazy() -> Result<PgPool, DatabaseError> {
        let url = Self::database_url()?;
        let pool = Self::pool_options().connect_lazy(&url)?;
        info!("Configured lazy database pool for {}", Self::redacted(&url));
        Ok(pool)
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Drop revoked-token rows whose tokens have expired anyway
    pub async fn prune_revoked_tokens(pool: &PgPool) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn pool_options() -> PgPoolOptions {
        let settings = &config::config().database;
        PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connection_timeout))
    }

    fn database_url() -> Result<String, DatabaseError> {
        config::config()
            .database
            .url
            .clone()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))
    }

    /// Connection string with the password masked, for logs
    fn redacted(database_url: &str) -> String {
        match url::Url::parse(database_url) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.to_string()
            }
            Err(_) => "<invalid database url>".to_string(),
        }
    }
}
