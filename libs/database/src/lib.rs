//! PostgreSQL connection management for the catalog.
//!
//! Turns configuration into a ready-to-use SeaORM [`DatabaseConnection`],
//! retries the initial connection, applies migrations and answers health checks.
//! Repositories receive the connection from here and never see connection
//! strings.
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//! use migration::Migrator;
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "catalog").await?;
//! ```
//!
//! [`DatabaseConnection`]: sea_orm::DatabaseConnection

pub mod error;
pub mod postgres;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryConfig, retry_with_backoff};
