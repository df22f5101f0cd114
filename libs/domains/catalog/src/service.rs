use std::sync::Arc;
use validator::Validate;

use crate::dto::{CategoryDto, CreateCategory, CreateProduct, ProductDto};
use crate::error::{CatalogError, CatalogResult};
use crate::mapping::parse_price;
use crate::models::{Activatable, Category, Identifiable, Product};
use crate::repository::{CategoryRepository, ProductRepository, Repository};

/// DTO-facing catalog operations over a category and a product repository
pub struct CatalogService<C: CategoryRepository, P: ProductRepository> {
    categories: Arc<C>,
    products: Arc<P>,
}

impl<C: CategoryRepository, P: ProductRepository> Clone for CatalogService<C, P> {
    fn clone(&self) -> Self {
        Self {
            categories: Arc::clone(&self.categories),
            products: Arc::clone(&self.products),
        }
    }
}

impl<C: CategoryRepository, P: ProductRepository> CatalogService<C, P> {
    pub fn new(categories: C, products: P) -> Self {
        Self {
            categories: Arc::new(categories),
            products: Arc::new(products),
        }
    }

    async fn require_category(&self, id: i32) -> CatalogResult<Category> {
        self.categories
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound {
                entity: Category::ENTITY,
                id,
            })
    }

    async fn require_product(&self, id: i32) -> CatalogResult<Product> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound {
                entity: Product::ENTITY,
                id,
            })
    }

    pub async fn create_category(&self, input: CreateCategory) -> CatalogResult<CategoryDto> {
        input.validate()?;

        let category = self
            .categories
            .create(Category::new(input.name, input.description))
            .await?;
        Ok(CategoryDto::from(&category))
    }

    pub async fn get_category(&self, id: i32) -> CatalogResult<Option<CategoryDto>> {
        let category = self.categories.get_by_id(id).await?;
        Ok(category.as_ref().map(CategoryDto::from))
    }

    pub async fn list_categories(&self) -> CatalogResult<Vec<CategoryDto>> {
        let categories = self.categories.get_all().await?;
        Ok(categories.iter().map(CategoryDto::from).collect())
    }

    pub async fn set_category_active(&self, id: i32, active: bool) -> CatalogResult<CategoryDto> {
        let mut category = self.require_category(id).await?;
        category.set_active(active);

        let category = self.categories.update(category).await?;
        Ok(CategoryDto::from(&category))
    }

    /// Fails with a persistence error while products still reference the category
    pub async fn delete_category(&self, id: i32) -> CatalogResult<()> {
        let category = self.require_category(id).await?;
        self.categories.delete(&category).await
    }

    pub async fn list_products_in_category(&self, category_id: i32) -> CatalogResult<Vec<ProductDto>> {
        let category = self.require_category(category_id).await?;
        let products = self.categories.get_products_by_category(&category).await?;
        Ok(products.iter().map(ProductDto::from).collect())
    }

    pub async fn create_product(&self, input: CreateProduct) -> CatalogResult<ProductDto> {
        input.validate()?;
        let price = parse_price(&input.price)?;
        let category = self.require_category(input.category_id).await?;

        let product = self
            .products
            .create(Product::new(input.name, price, category, input.description))
            .await?;
        Ok(ProductDto::from(&product))
    }

    pub async fn get_product(&self, id: i32) -> CatalogResult<Option<ProductDto>> {
        let product = self.products.get_by_id(id).await?;
        Ok(product.as_ref().map(ProductDto::from))
    }

    pub async fn list_products(&self) -> CatalogResult<Vec<ProductDto>> {
        let products = self.products.get_all().await?;
        Ok(products.iter().map(ProductDto::from).collect())
    }

    pub async fn change_product_price(&self, id: i32, price: &str) -> CatalogResult<ProductDto> {
        let price = parse_price(price)?;
        let mut product = self.require_product(id).await?;
        product.change_price(price);

        let product = self.products.update(product).await?;
        Ok(ProductDto::from(&product))
    }

    pub async fn set_product_active(&self, id: i32, active: bool) -> CatalogResult<ProductDto> {
        let mut product = self.require_product(id).await?;
        product.set_active(active);

        let product = self.products.update(product).await?;
        Ok(ProductDto::from(&product))
    }

    pub async fn delete_product(&self, id: i32) -> CatalogResult<()> {
        let product = self.require_product(id).await?;
        self.products.delete(&product).await
    }
}
