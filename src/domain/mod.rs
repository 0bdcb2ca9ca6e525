// ==========================================
// SiteTrak - Domain Model Layer
// ==========================================
// Responsibility: entities and value types of the takeoff import pipeline
// Red line: no data access logic, no orchestration logic
// ==========================================

pub mod takeoff;
pub mod types;

// Re-export core types
pub use takeoff::{
    ColumnMapping, CommitOutcome, ComponentAttributes, ComponentRecord, Drawing,
    DuplicateIdentity, ImportBatch, ImportCommit, ImportResult, MappingResult, MetadataPlan,
    MetadataReference, ParsedRow, ReferenceState, RowError, TargetField, UnmappedColumn,
    NO_SIZE_TOKEN,
};
pub use types::{ComponentType, MatchConfidence, ReferenceKind};
