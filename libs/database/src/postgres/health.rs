use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use std::time::Instant;
use tracing::debug;

use crate::error::{DatabaseError, DatabaseResult};

/// Tables the catalog repositories read and write
pub const CATALOG_TABLES: [&str; 2] = ["categories", "products"];

/// Outcome of [`check_health_detailed`]
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Run `SELECT 1` against the connection
pub async fn check_health(db: &DatabaseConnection) -> DatabaseResult<()> {
    run_health_query(db, "SELECT 1").await
}

/// Verify that the catalog tables exist and are readable.
///
/// Fails when migrations have not been applied.
pub async fn check_catalog_schema(db: &DatabaseConnection) -> DatabaseResult<()> {
    for table in CATALOG_TABLES {
        run_health_query(db, &format!("SELECT 1 FROM {} LIMIT 1", table)).await?;
    }
    Ok(())
}

/// [`check_health`] with timing, never failing
pub async fn check_health_detailed(db: &DatabaseConnection) -> HealthStatus {
    let start = Instant::now();
    let result = check_health(db).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    HealthStatus {
        healthy: result.is_ok(),
        message: result.err().map(|e| e.to_string()),
        response_time_ms,
    }
}

async fn run_health_query(db: &DatabaseConnection, query: &str) -> DatabaseResult<()> {
    debug!(query, "Running PostgreSQL health query");

    let stmt = Statement::from_string(DatabaseBackend::Postgres, query.to_owned());
    db.query_one_raw(stmt)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("'{}': {}", query, e)))?;

    Ok(())
}
