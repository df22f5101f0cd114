//! Repository contracts for catalog entities

use async_trait::async_trait;
use tracing::warn;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, Identifiable, Product};

/// Generic CRUD contract over one entity type
///
/// Every call is its own unit of work. Implementations never retry.
#[async_trait]
pub trait Repository<E>: Send + Sync
where
    E: Identifiable + Send + Sync + 'static,
{
    /// Persist a new entity and return it with the store-assigned identity
    async fn create(&self, entity: E) -> CatalogResult<E>;

    /// Remove the record matching the entity's id and version
    ///
    /// A missing record is `NotFound`; a version mismatch is `Concurrency`.
    async fn delete(&self, entity: &E) -> CatalogResult<()>;

    /// Every record, ordered by id
    async fn get_all(&self) -> CatalogResult<Vec<E>>;

    /// `None` when no record has this id
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<E>>;

    /// Write the mutable fields and return the entity with its bumped version
    async fn update(&self, entity: E) -> CatalogResult<E>;
}

#[async_trait]
pub trait CategoryRepository: Repository<Category> {
    /// Products whose category id equals `category.id()`, ordered by name then id
    async fn get_products_by_category(&self, category: &Category) -> CatalogResult<Vec<Product>>;
}

pub trait ProductRepository: Repository<Product> {}

/// Field checks run before any write reaches the store
pub(crate) fn validate_category(category: &Category) -> CatalogResult<()> {
    category.validate()?;
    Ok(())
}

/// Field checks plus the requirement that the owning category is saved
pub(crate) fn validate_product(product: &Product) -> CatalogResult<()> {
    product.validate()?;
    if !product.category().is_persisted() {
        return Err(CatalogError::Validation(
            "product category must be saved before the product".to_string(),
        ));
    }
    Ok(())
}

/// Version an update writes; a caller version that cannot be bumped never
/// matches a stored row
pub(crate) fn next_version<E: Identifiable>(operation: &'static str, entity: &E) -> CatalogResult<i32> {
    entity.version().checked_add(1).ok_or_else(|| {
        warn!(
            entity = E::ENTITY,
            id = entity.id(),
            version = entity.version(),
            operation,
            "Version out of range"
        );
        CatalogError::Concurrency {
            operation,
            entity: E::ENTITY,
            id: entity.id(),
        }
    })
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub CategoryRepository {}

        #[async_trait]
        impl Repository<Category> for CategoryRepository {
            async fn create(&self, entity: Category) -> CatalogResult<Category>;
            async fn delete(&self, entity: &Category) -> CatalogResult<()>;
            async fn get_all(&self) -> CatalogResult<Vec<Category>>;
            async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Category>>;
            async fn update(&self, entity: Category) -> CatalogResult<Category>;
        }

        #[async_trait]
        impl CategoryRepository for CategoryRepository {
            async fn get_products_by_category(&self, category: &Category) -> CatalogResult<Vec<Product>>;
        }
    }

    mock! {
        pub ProductRepository {}

        #[async_trait]
        impl Repository<Product> for ProductRepository {
            async fn create(&self, entity: Product) -> CatalogResult<Product>;
            async fn delete(&self, entity: &Product) -> CatalogResult<()>;
            async fn get_all(&self) -> CatalogResult<Vec<Product>>;
            async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Product>>;
            async fn update(&self, entity: Product) -> CatalogResult<Product>;
        }

        impl ProductRepository for ProductRepository {}
    }
}
