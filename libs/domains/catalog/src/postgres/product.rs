use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{db_err, write_conflict};
use crate::cancellation::cancellable;
use crate::entity::{category, product};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, Identifiable, Product};
use crate::repository::{ProductRepository, Repository, next_version, validate_product};

/// Build a product from a `products` row joined with its category row
pub(super) fn join_product(
    operation: &'static str,
    (model, category): (product::Model, Option<category::Model>),
) -> CatalogResult<Product> {
    let category = category.ok_or_else(|| CatalogError::Persistence {
        operation,
        message: format!(
            "product {} references missing category {}",
            model.id, model.category_id
        ),
    })?;
    Ok(model.into_product(Category::from(category)))
}

/// Current row of the category a written product points at
async fn load_category<C: ConnectionTrait>(
    conn: &C,
    operation: &'static str,
    id: i32,
) -> CatalogResult<Category> {
    category::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err(operation))?
        .map(Category::from)
        .ok_or_else(|| CatalogError::Persistence {
            operation,
            message: format!("category {} does not exist", id),
        })
}

#[derive(Clone)]
pub struct PgProductRepository {
    db: DatabaseConnection,
    cancel: CancellationToken,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future calls once `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    fn changes(entity: &Product) -> product::ActiveModel {
        product::ActiveModel {
            name: Set(entity.name().to_owned()),
            description: Set(entity.description().map(str::to_owned)),
            price: Set(entity.price()),
            status: Set(entity.status()),
            category_id: Set(entity.category_id()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Repository<Product> for PgProductRepository {
    async fn create(&self, entity: Product) -> CatalogResult<Product> {
        validate_product(&entity)?;

        cancellable(&self.cancel, "create", async {
            let txn = self.db.begin().await.map_err(db_err("create"))?;

            let mut model = Self::changes(&entity);
            model.created_date = Set(entity.created_date().into());
            model.version = Set(1);
            let model = model.insert(&txn).await.map_err(db_err("create"))?;
            let category = load_category(&txn, "create", model.category_id).await?;

            txn.commit().await.map_err(db_err("create"))?;

            info!(
                product_id = model.id,
                category_id = model.category_id,
                "Created product"
            );
            Ok(model.into_product(category))
        })
        .await
    }

    async fn delete(&self, entity: &Product) -> CatalogResult<()> {
        cancellable(&self.cancel, "delete", async {
            let txn = self.db.begin().await.map_err(db_err("delete"))?;

            let result = product::Entity::delete_many()
                .filter(product::Column::Id.eq(entity.id()))
                .filter(product::Column::Version.eq(entity.version()))
                .exec(&txn)
                .await
                .map_err(db_err("delete"))?;

            if result.rows_affected == 0 {
                let exists = product::Entity::find_by_id(entity.id())
                    .one(&txn)
                    .await
                    .map_err(db_err("delete"))?
                    .is_some();
                return Err(write_conflict("delete", entity, exists));
            }

            txn.commit().await.map_err(db_err("delete"))?;

            info!(product_id = entity.id(), "Deleted product");
            Ok(())
        })
        .await
    }

    async fn get_all(&self) -> CatalogResult<Vec<Product>> {
        cancellable(&self.cancel, "get_all", async {
            let rows = product::Entity::find()
                .find_also_related(category::Entity)
                .order_by_asc(product::Column::Id)
                .all(&self.db)
                .await
                .map_err(db_err("get_all"))?;

            debug!(count = rows.len(), "Listed products");
            rows.into_iter()
                .map(|row| join_product("get_all", row))
                .collect()
        })
        .await
    }

    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Product>> {
        cancellable(&self.cancel, "get_by_id", async {
            product::Entity::find_by_id(id)
                .find_also_related(category::Entity)
                .one(&self.db)
                .await
                .map_err(db_err("get_by_id"))?
                .map(|row| join_product("get_by_id", row))
                .transpose()
        })
        .await
    }

    async fn update(&self, entity: Product) -> CatalogResult<Product> {
        validate_product(&entity)?;

        cancellable(&self.cancel, "update", async {
            let version = next_version("update", &entity)?;
            let txn = self.db.begin().await.map_err(db_err("update"))?;

            let mut changes = Self::changes(&entity);
            changes.version = Set(version);

            let updated = product::Entity::update_many()
                .set(changes)
                .filter(product::Column::Id.eq(entity.id()))
                .filter(product::Column::Version.eq(entity.version()))
                .exec_with_returning(&txn)
                .await
                .map_err(db_err("update"))?;

            let Some(model) = updated.into_iter().next() else {
                let exists = product::Entity::find_by_id(entity.id())
                    .one(&txn)
                    .await
                    .map_err(db_err("update"))?
                    .is_some();
                return Err(write_conflict("update", &entity, exists));
            };
            let category = load_category(&txn, "update", model.category_id).await?;

            txn.commit().await.map_err(db_err("update"))?;

            info!(product_id = model.id, version = model.version, "Updated product");
            Ok(model.into_product(category))
        })
        .await
    }
}

impl ProductRepository for PgProductRepository {}
