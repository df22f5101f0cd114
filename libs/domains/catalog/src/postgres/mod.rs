//! PostgreSQL repositories backed by SeaORM
//!
//! Writes run in a transaction and carry the row version in their filter.
//! A write that matches no row is resolved by looking the id up again:
//! present means a concurrent change, absent means not found.

mod category;
mod product;

pub use category::PgCategoryRepository;
pub use product::PgProductRepository;

use sea_orm::DbErr;
use tracing::warn;

use crate::error::CatalogError;
use crate::models::Identifiable;

fn db_err(operation: &'static str) -> impl FnOnce(DbErr) -> CatalogError {
    move |err| CatalogError::from_db(operation, err)
}

/// Error for a versioned write that affected no row
fn write_conflict<E: Identifiable>(operation: &'static str, entity: &E, exists: bool) -> CatalogError {
    if exists {
        warn!(
            entity = E::ENTITY,
            id = entity.id(),
            version = entity.version(),
            operation,
            "Version conflict"
        );
        CatalogError::Concurrency {
            operation,
            entity: E::ENTITY,
            id: entity.id(),
        }
    } else {
        CatalogError::NotFound {
            entity: E::ENTITY,
            id: entity.id(),
        }
    }
}
