use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::PostgresConfig;
use crate::error::{DatabaseError, DatabaseResult};
use crate::retry::{RetryConfig, retry_with_backoff};

/// Connect with explicit SeaORM options
pub async fn connect_with_options(options: ConnectOptions) -> DatabaseResult<DatabaseConnection> {
    let db = Database::connect(options).await?;
    info!("Connected to PostgreSQL");
    Ok(db)
}

/// Connect using a [`PostgresConfig`]
pub async fn connect_from_config(config: PostgresConfig) -> DatabaseResult<DatabaseConnection> {
    connect_with_options(config.into_connect_options()).await
}

/// Connect using a [`PostgresConfig`], retrying with exponential backoff.
///
/// `None` uses [`RetryConfig::default`]. Once every attempt failed the last
/// error is reported as [`DatabaseError::ConnectionFailed`].
pub async fn connect_from_config_with_retry(
    config: PostgresConfig,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<DatabaseConnection> {
    let retry_config = retry_config.unwrap_or_default();
    let attempts = retry_config.attempts();
    let options = config.into_connect_options();

    retry_with_backoff(
        || {
            let opts = options.clone();
            connect_with_options(opts)
        },
        retry_config,
    )
    .await
    .map_err(|e| DatabaseError::ConnectionFailed {
        attempts,
        message: e.to_string(),
    })
}

/// Apply every pending migration of `M`
pub async fn run_migrations<M: MigratorTrait>(
    db: &DatabaseConnection,
    app_name: &str,
) -> DatabaseResult<()> {
    info!(app = app_name, "Running database migrations");
    M::up(db, None)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    info!(app = app_name, "Migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_with_retry_reports_attempts() {
        let config = PostgresConfig {
            connect_timeout_secs: 1,
            acquire_timeout_secs: 1,
            ..PostgresConfig::new("postgres://nobody@127.0.0.1:1/catalog")
        };
        let retry = RetryConfig::new()
            .with_max_retries(1)
            .with_initial_delay(Duration::from_millis(1));

        let err = connect_from_config_with_retry(config, Some(retry))
            .await
            .unwrap_err();

        assert!(matches!(err, DatabaseError::ConnectionFailed { attempts: 2, .. }));
    }
}
