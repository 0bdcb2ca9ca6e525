// ==========================================
// SiteTrak - Import Layer
// ==========================================
// Responsibility: external takeoff data in, exploded component records out
// Supports: CSV
// ==========================================

// Module declarations
pub mod column_mapper;
pub mod conflict_handler;
pub mod error;
pub mod exploder;
pub mod file_reader;
pub mod metadata;
pub mod row_parser;
pub mod takeoff_importer_impl;
pub mod takeoff_importer_trait;

// Re-export the core types
pub use column_mapper::{normalize_header, ColumnMapper as ColumnMapperImpl};
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use error::{ImportError, ImportResult};
pub use exploder::{component_id, size_token, Exploder as ExploderImpl};
pub use file_reader::{CsvReader, RawRow, RawTable};
pub use metadata::MetadataCollector as MetadataCollectorImpl;
pub use row_parser::RowParser as RowParserImpl;
pub use takeoff_importer_impl::TakeoffImporterImpl;

// Re-export the trait interfaces
pub use takeoff_importer_trait::{
    ColumnMapper, ConflictHandler, Exploder, FileReader, MetadataCollector, RowParser,
    TakeoffImporter,
};
