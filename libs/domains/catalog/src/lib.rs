//! Catalog Domain
//!
//! Categories and the products filed under them, persisted through a
//! repository abstraction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← DTO in, DTO out
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← CRUD contract (PostgreSQL + in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Category, Product, Pk, Status
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_catalog::{CatalogService, CreateCategory, InMemoryCatalog};
//!
//! # async fn run() -> domain_catalog::CatalogResult<()> {
//! let catalog = InMemoryCatalog::new();
//! let service = CatalogService::new(catalog.categories(), catalog.products());
//!
//! let beverages = service
//!     .create_category(CreateCategory {
//!         name: "Beverages".to_string(),
//!         description: None,
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod cancellation;
pub mod dto;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use dto::{CategoryDto, CreateCategory, CreateProduct, ProductDto};
pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use mapping::{format_price, parse_price};
pub use memory::{InMemoryCatalog, InMemoryCategoryRepository, InMemoryProductRepository};
pub use models::{Activatable, Category, Identifiable, Pk, Product, Status, MAX_PRICE, UNSAVED_ID};
pub use postgres::{PgCategoryRepository, PgProductRepository};
pub use repository::{CategoryRepository, ProductRepository, Repository};
pub use service::CatalogService;
pub use tokio_util::sync::CancellationToken;
