use crate::error::DbError;
use configuration::DatabaseConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Establishes a connection pool to the PostgreSQL database.
///
/// The URL comes from the loaded configuration, where `DATABASE_URL` has
/// already been folded in. The pool is cheap to clone and is shared by every
/// report; each report borrows one connection for the duration of its query.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let database_url = config.url.as_deref().ok_or_else(|| {
        DbError::ConnectionConfigError(
            "DATABASE_URL (or database.url in config.toml) must be set.".to_string(),
        )
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(database_url)
        .await?;

    tracing::debug!(max_connections = config.max_connections, "Connected to the database.");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_is_a_configuration_error() {
        let config = DatabaseConfig::default();
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionConfigError(_)));
        assert!(err.to_string().starts_with("Database connection is not configured"));
    }
}
