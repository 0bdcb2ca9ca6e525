// ==========================================
// SiteTrak - Import Module Error Types
// ==========================================
// Tool: thiserror derive macro
// ==========================================

use crate::domain::takeoff::DuplicateIdentity;
use crate::domain::TargetField;
use thiserror::Error;

/// Import pipeline error type
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (only .csv is accepted)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== Mapping errors =====
    #[error("missing required columns: {}", join_fields(.0))]
    MissingRequiredColumns(Vec<TargetField>),

    // ===== Batch precondition errors =====
    #[error("duplicate component ids in batch: {}", join_duplicates(.duplicates))]
    DuplicateIdentity { duplicates: Vec<DuplicateIdentity> },

    #[error("payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("user {user_id} may not import into project {project_id}")]
    Unauthorized { user_id: String, project_id: String },

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    // ===== Database errors =====
    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    // ===== Config errors =====
    #[error("config read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== General =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn join_fields(fields: &[TargetField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_duplicates(duplicates: &[DuplicateIdentity]) -> String {
    duplicates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InternalError(format!("serialization failed: {}", err))
    }
}

// From<RepositoryError>
impl From<crate::repository::error::RepositoryError> for ImportError {
    fn from(err: crate::repository::error::RepositoryError) -> Self {
        use crate::repository::error::RepositoryError;
        match err {
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => {
                ImportError::DatabaseTransactionError(msg)
            }
            other => ImportError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result type alias
pub type ImportResult<T> = Result<T, ImportError>;
