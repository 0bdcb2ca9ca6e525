// ==========================================
// SiteTrak - Core Library
// ==========================================
// Construction-project tracking: drawing takeoff import pipeline
// Stack: Rust + SQLite
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and value types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Importer layer - file intake pipeline
pub mod importer;

// Config layer - runtime configuration
pub mod config;

// Database infrastructure (connection init, uniform PRAGMAs, schema)
pub mod db;

// Logging
pub mod logging;

// Access control policies
pub mod auth;

// API layer - service surface
pub mod api;

// ==========================================
// Core type re-exports
// ==========================================

// Domain value types
pub use domain::types::{ComponentType, MatchConfidence, ReferenceKind};

// Domain entities
pub use domain::{
    ColumnMapping, ComponentRecord, Drawing, ImportBatch, ImportResult, MappingResult,
    MetadataPlan, MetadataReference, ParsedRow, RowError, TargetField, NO_SIZE_TOKEN,
};

// Importer pipeline
pub use importer::{
    ColumnMapperImpl, ConflictHandlerImpl, CsvReader, ExploderImpl, ImportError,
    MetadataCollectorImpl, RowParserImpl, TakeoffImporterImpl,
};

// Repositories
pub use repository::{TakeoffImportRepository, TakeoffImportRepositoryImpl};

// Configuration
pub use config::{ConfigManager, ImportConfigReader};

// Access control
pub use auth::{AccessPolicy, MembershipPolicy, OpenAccessPolicy};

// API
pub use api::{ApiError, ApiResult, ImportApi};

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Application name
pub const APP_NAME: &str = "SiteTrak";

// ==========================================
// Compile-time visibility checks
// ==========================================
