use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::product::join_product;
use super::{db_err, write_conflict};
use crate::cancellation::cancellable;
use crate::entity::{category, product};
use crate::error::CatalogResult;
use crate::models::{Category, Identifiable, Product};
use crate::repository::{CategoryRepository, Repository, next_version, validate_category};

#[derive(Clone)]
pub struct PgCategoryRepository {
    db: DatabaseConnection,
    cancel: CancellationToken,
}

impl PgCategoryRepository {
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

    fn changes(entity: &Category) -> category::ActiveModel {
        category::ActiveModel {
            name: Set(entity.name().to_owned()),
            description: Set(entity.description().map(str::to_owned)),
            status: Set(entity.status()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Repository<Category> for PgCategoryRepository {
    async fn create(&self, entity: Category) -> CatalogResult<Category> {
        validate_category(&entity)?;

        cancellable(&self.cancel, "create", async {
            let txn = self.db.begin().await.map_err(db_err("create"))?;

            let mut model = Self::changes(&entity);
            model.created_date = Set(entity.created_date().into());
            model.version = Set(1);
            let model = model.insert(&txn).await.map_err(db_err("create"))?;

            txn.commit().await.map_err(db_err("create"))?;

            info!(category_id = model.id, "Created category");
            Ok(Category::from(model))
        })
        .await
    }

    async fn delete(&self, entity: &Category) -> CatalogResult<()> {
        cancellable(&self.cancel, "delete", async {
            let txn = self.db.begin().await.map_err(db_err("delete"))?;

            let result = category::Entity::delete_many()
                .filter(category::Column::Id.eq(entity.id()))
                .filter(category::Column::Version.eq(entity.version()))
                .exec(&txn)
                .await
                .map_err(db_err("delete"))?;

            if result.rows_affected == 0 {
                let exists = category::Entity::find_by_id(entity.id())
                    .one(&txn)
                    .await
                    .map_err(db_err("delete"))?
                    .is_some();
                return Err(write_conflict("delete", entity, exists));
            }

            txn.commit().await.map_err(db_err("delete"))?;

            info!(category_id = entity.id(), "Deleted category");
            Ok(())
        })
        .await
    }

    async fn get_all(&self) -> CatalogResult<Vec<Category>> {
        cancellable(&self.cancel, "get_all", async {
            let models = category::Entity::find()
                .order_by_asc(category::Column::Id)
                .all(&self.db)
                .await
                .map_err(db_err("get_all"))?;

            debug!(count = models.len(), "Listed categories");
            Ok(models.into_iter().map(Category::from).collect())
        })
        .await
    }

    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Category>> {
        cancellable(&self.cancel, "get_by_id", async {
            let model = category::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(db_err("get_by_id"))?;

            Ok(model.map(Category::from))
        })
        .await
    }

    async fn update(&self, entity: Category) -> CatalogResult<Category> {
        validate_category(&entity)?;

        cancellable(&self.cancel, "update", async {
            let version = next_version("update", &entity)?;
            let txn = self.db.begin().await.map_err(db_err("update"))?;

            let mut changes = Self::changes(&entity);
            changes.version = Set(version);

            let updated = category::Entity::update_many()
                .set(changes)
                .filter(category::Column::Id.eq(entity.id()))
                .filter(category::Column::Version.eq(entity.version()))
                .exec_with_returning(&txn)
                .await
                .map_err(db_err("update"))?;

            let Some(model) = updated.into_iter().next() else {
                let exists = category::Entity::find_by_id(entity.id())
                    .one(&txn)
                    .await
                    .map_err(db_err("update"))?
                    .is_some();
                return Err(write_conflict("update", &entity, exists));
            };

            txn.commit().await.map_err(db_err("update"))?;

            info!(category_id = model.id, version = model.version, "Updated category");
            Ok(Category::from(model))
        })
        .await
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn get_products_by_category(&self, category: &Category) -> CatalogResult<Vec<Product>> {
        if !category.is_persisted() {
            return Ok(Vec::new());
        }

        cancellable(&self.cancel, "get_products_by_category", async {
            let rows = product::Entity::find()
                .find_also_related(category::Entity)
                .filter(product::Column::CategoryId.eq(category.id()))
                .order_by_asc(product::Column::Name)
                .order_by_asc(product::Column::Id)
                .all(&self.db)
                .await
                .map_err(db_err("get_products_by_category"))?;

            debug!(category_id = category.id(), count = rows.len(), "Listed products in category");
            rows.into_iter()
                .map(|row| join_product("get_products_by_category", row))
                .collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogError, ErrorKind};
    use crate::models::{Activatable, Status};
    use chrono::{SubsecRound, Utc};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    fn model(id: i32, name: &str, version: i32) -> category::Model {
        category::Model {
            id,
            name: name.to_string(),
            description: None,
            status: Status::Active,
            created_date: Utc::now().trunc_subsecs(6).into(),
            version,
        }
    }

    fn repo(db: MockDatabase) -> PgCategoryRepository {
        PgCategoryRepository::new(db.into_connection())
    }

    #[tokio::test]
    async fn test_get_all_maps_rows_in_order() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model(1, "Beverages", 1), model(2, "Snacks", 3)]]),
        );

        let categories = repo.get_all().await.unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name(), "Beverages");
        assert_eq!(categories[1].id(), 2);
        assert_eq!(categories[1].version(), 3);
    }

    #[tokio::test]
    async fn test_get_by_id_found_and_absent() {
        let row = model(1, "Beverages", 1);
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![row.clone()], Vec::new()]),
        );

        let found = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(found, Category::from(row));
        assert!(repo.get_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_returns_store_identity() {
        let draft = Category::new("Beverages", None);
        let mut row = model(1, "Beverages", 1);
        row.created_date = draft.created_date().into();
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![row]]));

        let created = repo.create(draft.clone()).await.unwrap();

        assert_eq!(created.id(), 1);
        assert_eq!(created.name(), draft.name());
        assert_eq!(created.created_date(), draft.created_date());
    }

    #[tokio::test]
    async fn test_create_validates_before_io() {
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres));

        let err = repo.create(Category::new("", None)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_delete_missing_row_is_not_found() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([Vec::<category::Model>::new()]),
        );
        let gone = Category::from(model(7, "Gone", 1));

        let err = repo.delete(&gone).await.unwrap_err();

        assert!(matches!(err, CatalogError::NotFound { entity: "Category", id: 7 }));
    }

    #[tokio::test]
    async fn test_delete_stale_version_is_concurrency() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([vec![model(7, "Beverages", 2)]]),
        );
        let stale = Category::from(model(7, "Beverages", 1));

        let err = repo.delete(&stale).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Concurrency);
    }

    #[tokio::test]
    async fn test_delete_removes_matching_row() {
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
        ]));

        repo.delete(&Category::from(model(3, "Snacks", 1))).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_conflict_is_concurrency() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::new(), vec![model(4, "Beverages", 5)]]),
        );
        let mut stale = Category::from(model(4, "Beverages", 4));
        stale.set_active(false);

        let err = repo.update(stale).await.unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Concurrency {
                operation: "update",
                id: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_update_returns_bumped_version() {
        let mut stored = model(4, "Beverages", 2);
        stored.status = Status::Inactive;
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![stored]]),
        );
        let mut current = Category::from(model(4, "Beverages", 1));
        current.set_active(false);

        let updated = repo.update(current).await.unwrap();

        assert_eq!(updated.version(), 2);
        assert!(!updated.is_active());
    }

    #[tokio::test]
    async fn test_update_at_max_version_is_concurrency() {
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres));
        let mut current = Category::from(model(4, "Beverages", i32::MAX));
        current.set_active(false);

        let err = repo.update(current).await.unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Concurrency {
                operation: "update",
                id: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_connection_error_is_persistence() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection reset".to_string())]),
        );

        let err = repo.get_all().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(err.to_string().contains("get_all"));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres)).with_cancellation(token);

        let err = repo.get_all().await.unwrap_err();

        assert!(matches!(err, CatalogError::Cancelled { operation: "get_all" }));
    }

    #[tokio::test]
    async fn test_unsaved_category_has_no_products() {
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres));

        let products = repo
            .get_products_by_category(&Category::new("Beverages", None))
            .await
            .unwrap();

        assert!(products.is_empty());
    }
}
