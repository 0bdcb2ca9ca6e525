// ==========================================
// SiteTrak - Data Repository Layer
// ==========================================
// Red line: repositories contain no import business logic
// ==========================================
// Responsibility: data access interfaces over SQLite
// Constraint: all queries are parameterized
// ==========================================

pub mod error;
pub mod takeoff_import_repo;
pub mod takeoff_import_repo_impl;

// Re-export the core repository surface
pub use error::{RepositoryError, RepositoryResult};
pub use takeoff_import_repo::TakeoffImportRepository;
pub use takeoff_import_repo_impl::TakeoffImportRepositoryImpl;
