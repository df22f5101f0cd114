use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use validator::ValidationErrors;

/// Error kinds reported by every catalog operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Persistence,
    Concurrency,
    Cancelled,
    NotFound,
    Format,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Persistence failure during {operation}: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },

    #[error("{entity} {id} was modified or removed concurrently during {operation}")]
    Concurrency {
        operation: &'static str,
        entity: &'static str,
        id: i32,
    },

    #[error("Operation {operation} was cancelled")]
    Cancelled { operation: &'static str },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i32 },

    #[error("Invalid price '{value}': {reason}")]
    Format { value: String, reason: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::Persistence { .. } => ErrorKind::Persistence,
            CatalogError::Concurrency { .. } => ErrorKind::Concurrency,
            CatalogError::Cancelled { .. } => ErrorKind::Cancelled,
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
            CatalogError::Format { .. } => ErrorKind::Format,
        }
    }

    /// Classify a store error raised while running `operation`.
    ///
    /// Constraint violations keep their constraint detail in the message.
    /// `RecordNotUpdated` never reaches this point; repositories resolve it
    /// into `Concurrency` or `NotFound` themselves.
    pub fn from_db(operation: &'static str, err: DbErr) -> Self {
        let message = match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                format!("unique constraint violated: {}", detail)
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                format!("foreign key constraint violated: {}", detail)
            }
            _ => err.to_string(),
        };

        CatalogError::Persistence { operation, message }
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        CatalogError::Validation(errors.to_string())
    }
}
