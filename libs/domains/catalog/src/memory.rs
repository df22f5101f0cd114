//! In-memory catalog store for development and tests
//!
//! Mirrors the PostgreSQL repositories: sequential ids starting at 1, version
//! checks on update and delete, and the `products.category_id` foreign key
//! (restrict on delete).

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancellation::cancellable;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, Identifiable, Pk, Product};
use crate::repository::{
    CategoryRepository, ProductRepository, Repository, next_version, validate_category,
    validate_product,
};

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<i32, Category>,
    products: BTreeMap<i32, Product>,
    category_seq: i32,
    product_seq: i32,
}

impl Tables {
    /// Referenced category as currently stored, or a foreign key failure
    fn referenced_category(&self, operation: &'static str, id: i32) -> CatalogResult<Category> {
        self.categories
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::Persistence {
                operation,
                message: format!(
                    "foreign key constraint violated: category {} does not exist",
                    id
                ),
            })
    }

    /// Stored product joined with its current category row
    fn load_product(&self, operation: &'static str, product: &Product) -> CatalogResult<Product> {
        let category = self.referenced_category(operation, product.category_id())?;
        Ok(product.clone().with_category(category))
    }
}

fn check_version<E: Identifiable>(
    operation: &'static str,
    stored: &E,
    entity: &E,
) -> CatalogResult<()> {
    if stored.version() != entity.version() {
        warn!(
            entity = E::ENTITY,
            id = entity.id(),
            expected = entity.version(),
            actual = stored.version(),
            "Version conflict"
        );
        return Err(CatalogError::Concurrency {
            operation,
            entity: E::ENTITY,
            id: entity.id(),
        });
    }
    Ok(())
}

fn not_found<E: Identifiable>(id: i32) -> CatalogError {
    CatalogError::NotFound {
        entity: E::ENTITY,
        id,
    }
}

/// Shared table set handing out category and product repositories
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    tables: Arc<RwLock<Tables>>,
    cancel: CancellationToken,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future calls once `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository {
            catalog: self.clone(),
        }
    }

    pub fn products(&self) -> InMemoryProductRepository {
        InMemoryProductRepository {
            catalog: self.clone(),
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCategoryRepository {
    catalog: InMemoryCatalog,
}

#[async_trait]
impl Repository<Category> for InMemoryCategoryRepository {
    async fn create(&self, entity: Category) -> CatalogResult<Category> {
        validate_category(&entity)?;

        cancellable(&self.catalog.cancel, "create", async {
            let mut tables = self.catalog.tables.write().await;
            tables.category_seq += 1;
            let pk = Pk::restore(tables.category_seq, entity.created_date(), 1);
            let created = entity.with_pk(pk);
            tables.categories.insert(created.id(), created.clone());

            info!(category_id = created.id(), "Created category");
            Ok(created)
        })
        .await
    }

    async fn delete(&self, entity: &Category) -> CatalogResult<()> {
        cancellable(&self.catalog.cancel, "delete", async {
            let mut tables = self.catalog.tables.write().await;
            let id = entity.id();
            let stored = tables
                .categories
                .get(&id)
                .ok_or_else(|| not_found::<Category>(id))?;
            check_version("delete", stored, entity)?;

            if tables.products.values().any(|p| p.category_id() == id) {
                return Err(CatalogError::Persistence {
                    operation: "delete",
                    message: format!(
                        "foreign key constraint violated: category {} is still referenced by products",
                        id
                    ),
                });
            }

            tables.categories.remove(&id);
            info!(category_id = id, "Deleted category");
            Ok(())
        })
        .await
    }

    async fn get_all(&self) -> CatalogResult<Vec<Category>> {
        cancellable(&self.catalog.cancel, "get_all", async {
            let tables = self.catalog.tables.read().await;
            debug!(count = tables.categories.len(), "Listed categories");
            Ok(tables.categories.values().cloned().collect())
        })
        .await
    }

    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Category>> {
        cancellable(&self.catalog.cancel, "get_by_id", async {
            let tables = self.catalog.tables.read().await;
            Ok(tables.categories.get(&id).cloned())
        })
        .await
    }

    async fn update(&self, entity: Category) -> CatalogResult<Category> {
        validate_category(&entity)?;

        cancellable(&self.catalog.cancel, "update", async {
            let mut tables = self.catalog.tables.write().await;
            let id = entity.id();
            let stored = tables
                .categories
                .get(&id)
                .ok_or_else(|| not_found::<Category>(id))?;
            check_version("update", stored, &entity)?;
            let version = next_version("update", &entity)?;

            let pk = Pk::restore(id, stored.created_date(), version);
            let updated = entity.with_pk(pk);
            tables.categories.insert(id, updated.clone());

            info!(category_id = id, version = updated.version(), "Updated category");
            Ok(updated)
        })
        .await
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn get_products_by_category(&self, category: &Category) -> CatalogResult<Vec<Product>> {
        if !category.is_persisted() {
            return Ok(Vec::new());
        }

        cancellable(&self.catalog.cancel, "get_products_by_category", async {
            let tables = self.catalog.tables.read().await;
            let mut products = tables
                .products
                .values()
                .filter(|p| p.category_id() == category.id())
                .map(|p| tables.load_product("get_products_by_category", p))
                .collect::<CatalogResult<Vec<_>>>()?;
            products.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
            Ok(products)
        })
        .await
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryProductRepository {
    catalog: InMemoryCatalog,
}

#[async_trait]
impl Repository<Product> for InMemoryProductRepository {
    async fn create(&self, entity: Product) -> CatalogResult<Product> {
        validate_product(&entity)?;

        cancellable(&self.catalog.cancel, "create", async {
            let mut tables = self.catalog.tables.write().await;
            let category = tables.referenced_category("create", entity.category_id())?;

            tables.product_seq += 1;
            let pk = Pk::restore(tables.product_seq, entity.created_date(), 1);
            let created = entity.with_pk(pk).with_category(category);
            tables.products.insert(created.id(), created.clone());

            info!(
                product_id = created.id(),
                category_id = created.category_id(),
                "Created product"
            );
            Ok(created)
        })
        .await
    }

    async fn delete(&self, entity: &Product) -> CatalogResult<()> {
        cancellable(&self.catalog.cancel, "delete", async {
            let mut tables = self.catalog.tables.write().await;
            let id = entity.id();
            let stored = tables
                .products
                .get(&id)
                .ok_or_else(|| not_found::<Product>(id))?;
            check_version("delete", stored, entity)?;

            tables.products.remove(&id);
            info!(product_id = id, "Deleted product");
            Ok(())
        })
        .await
    }

    async fn get_all(&self) -> CatalogResult<Vec<Product>> {
        cancellable(&self.catalog.cancel, "get_all", async {
            let tables = self.catalog.tables.read().await;
            debug!(count = tables.products.len(), "Listed products");
            tables
                .products
                .values()
                .map(|p| tables.load_product("get_all", p))
                .collect()
        })
        .await
    }

    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Product>> {
        cancellable(&self.catalog.cancel, "get_by_id", async {
            let tables = self.catalog.tables.read().await;
            tables
                .products
                .get(&id)
                .map(|p| tables.load_product("get_by_id", p))
                .transpose()
        })
        .await
    }

    async fn update(&self, entity: Product) -> CatalogResult<Product> {
        validate_product(&entity)?;

        cancellable(&self.catalog.cancel, "update", async {
            let mut tables = self.catalog.tables.write().await;
            let id = entity.id();
            let stored = tables
                .products
                .get(&id)
                .ok_or_else(|| not_found::<Product>(id))?;
            check_version("update", stored, &entity)?;
            let version = next_version("update", &entity)?;
            let pk = Pk::restore(id, stored.created_date(), version);

            let category = tables.referenced_category("update", entity.category_id())?;
            let updated = entity.with_pk(pk).with_category(category);
            tables.products.insert(id, updated.clone());

            info!(product_id = id, version = updated.version(), "Updated product");
            Ok(updated)
        })
        .await
    }
}

impl ProductRepository for InMemoryProductRepository {}
