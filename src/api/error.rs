// ==========================================
// SiteTrak - API Layer Error Types
// ==========================================
// Responsibility: convert importer/repository errors into messages a
// UI or CLI can show directly
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API layer error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Request errors
    // ==========================================
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("validation failed: {0}")]
    ValidationError(String),

    // ==========================================
    // Import errors
    // ==========================================
    #[error("import failed: {0}")]
    ImportError(String),

    // ==========================================
    // Data access errors
    // ==========================================
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // General errors
    // ==========================================
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// From ImportError
// Purpose: keep the caller-facing category while dropping pipeline detail
// the UI cannot act on
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            // File and format problems are import errors to the caller
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::CsvParseError(_) => ApiError::ImportError(err.to_string()),

            // A header set we cannot map is bad input, not a crash
            ImportError::MissingRequiredColumns(_) => ApiError::InvalidInput(err.to_string()),

            // Batch precondition failures
            ImportError::DuplicateIdentity { .. } | ImportError::PayloadTooLarge { .. } => {
                ApiError::ValidationError(err.to_string())
            }
            ImportError::Unauthorized { .. } => ApiError::Unauthorized(err.to_string()),
            ImportError::ProjectNotFound(_) => ApiError::NotFound(err.to_string()),

            // Database errors
            ImportError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            ImportError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            // Everything else
            ImportError::ConfigReadError { .. } => ApiError::InternalError(err.to_string()),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// From RepositoryError
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={}) does not exist", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("database lock failed: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("unique constraint violated: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("foreign key violated: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

/// Result type alias
pub type ApiResult<T> = Result<T, ApiError>;
