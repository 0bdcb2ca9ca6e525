// ==========================================
// SiteTrak - Takeoff Import Traits
// ==========================================
// Responsibility: define the import pipeline interfaces (no implementations)
// ==========================================

use crate::domain::takeoff::{
    ComponentRecord, DuplicateIdentity, MappingResult, MetadataPlan, ParsedRow, RowError,
    TargetField,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_reader::{RawRow, RawTable};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// TakeoffImporter Trait
// ==========================================
// Purpose: main takeoff import interface
// Implementor: TakeoffImporterImpl
#[async_trait]
pub trait TakeoffImporter: Send + Sync {
    /// Import a takeoff CSV file into a project.
    ///
    /// # Arguments
    /// - project_id: target project (authorization scope)
    /// - user_id: acting user, checked against project membership
    /// - file_path: CSV file path (.csv)
    ///
    /// # Returns
    /// - Ok(ImportResult): commit summary with per-row errors
    /// - Err: file, mapping, precondition, or database error
    ///
    /// # Pipeline stages
    /// 1. Read file into headers + raw rows
    /// 2. Map headers to canonical fields (abort if required ones missing)
    /// 3. Parse rows, accumulating per-row errors
    /// 4. Explode quantities into unit records
    /// 5. Detect duplicate component ids across the batch
    /// 6. Collect and discover metadata references
    /// 7. Check payload size and authorization
    /// 8. Commit everything in one transaction
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        project_id: &str,
        user_id: &str,
        file_path: P,
    ) -> ImportResult<crate::domain::takeoff::ImportResult>;

    /// Import rows that were already parsed upstream (UI-side mapping).
    ///
    /// # Arguments
    /// - project_id: target project (authorization scope)
    /// - user_id: acting user
    /// - rows: parsed rows, row numbers preserved from the source
    /// - file_name: original file name for the audit trail, if known
    ///
    /// # Returns
    /// - Ok(ImportResult): commit summary
    /// - Err: precondition or database error
    async fn import_rows(
        &self,
        project_id: &str,
        user_id: &str,
        rows: Vec<ParsedRow>,
        file_name: Option<String>,
    ) -> ImportResult<crate::domain::takeoff::ImportResult>;

    /// Map a file's headers without importing anything.
    ///
    /// # Arguments
    /// - file_path: CSV file path (.csv)
    ///
    /// # Returns
    /// - Ok(MappingResult): mappings, missing required fields, unmapped
    ///   columns; nothing is written
    /// - Err: file read error
    async fn preview_mapping<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<MappingResult>;

    /// Import several files concurrently, one commit per file.
    ///
    /// # Arguments
    /// - project_id: target project for every file
    /// - user_id: acting user
    /// - file_paths: CSV file paths
    ///
    /// # Returns
    /// - Ok(Vec<Result<ImportResult, ImportError>>): per-file outcomes in
    ///   input order; one file failing does not stop the others
    async fn import_files<P: AsRef<Path> + Send + Sync>(
        &self,
        project_id: &str,
        user_id: &str,
        file_paths: Vec<P>,
    ) -> ImportResult<Vec<Result<crate::domain::takeoff::ImportResult, ImportError>>>;
}

// ==========================================
// FileReader Trait
// ==========================================
// Purpose: stage 0, file -> positional table
// Implementor: CsvReader
pub trait FileReader: Send + Sync {
    /// Read a delimited file into headers plus raw rows.
    ///
    /// # Arguments
    /// - file_path: file path
    ///
    /// # Returns
    /// - Ok(RawTable): headers and non-blank data rows, cells trimmed
    /// - Err: missing file, unsupported extension, parse failure
    fn read_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

// ==========================================
// ColumnMapper Trait
// ==========================================
// Purpose: stage 1, source headers -> canonical field mappings
// Implementor: ColumnMapper
pub trait ColumnMapper: Send + Sync {
    /// Match source headers against the canonical fields.
    ///
    /// # Arguments
    /// - headers: header cells in file order
    /// - extra_synonyms: config-supplied synonyms merged after the built-in
    ///   lists
    ///
    /// # Returns
    /// - MappingResult: never an error; missing required fields are data,
    ///   and the caller decides whether to abort
    fn map_headers(
        &self,
        headers: &[String],
        extra_synonyms: &HashMap<TargetField, Vec<String>>,
    ) -> MappingResult;
}

// ==========================================
// RowParser Trait
// ==========================================
// Purpose: stage 2, raw row -> typed ParsedRow
// Implementor: RowParser
pub trait RowParser: Send + Sync {
    /// Parse one raw row using the column mappings.
    ///
    /// # Arguments
    /// - row: raw cells with their 1-based data row number
    /// - mapping: output of the column mapper
    ///
    /// # Returns
    /// - Ok(ParsedRow): all required fields present and typed
    /// - Err(Vec<RowError>): every failure found in this row; the caller
    ///   continues with the next row
    fn parse_row(&self, row: &RawRow, mapping: &MappingResult) -> Result<ParsedRow, Vec<RowError>>;
}

// ==========================================
// Exploder Trait
// ==========================================
// Purpose: stage 3, parsed rows -> quantity-exploded unit records
// Implementor: Exploder
pub trait Exploder: Send + Sync {
    /// Expand every row into `quantity` component records with
    /// deterministic ids.
    ///
    /// # Arguments
    /// - rows: parsed rows in source order
    ///
    /// # Returns
    /// - Vec<ComponentRecord>: row order preserved, sequences dense from 1
    fn explode(&self, rows: &[ParsedRow]) -> Vec<ComponentRecord>;
}

// ==========================================
// MetadataCollector Trait
// ==========================================
// Purpose: stage 4, parsed rows -> deduplicated reference names per kind
// Implementor: MetadataCollector
pub trait MetadataCollector: Send + Sync {
    /// Collect distinct non-empty area / system / test package names.
    ///
    /// # Arguments
    /// - rows: parsed rows
    ///
    /// # Returns
    /// - MetadataPlan: per-kind name lists in first-seen order, existence
    ///   state unfilled
    fn collect(&self, rows: &[ParsedRow]) -> MetadataPlan;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// Purpose: cross-row duplicate component id detection
// Implementor: ConflictHandler
pub trait ConflictHandler: Send + Sync {
    /// Find component ids that occur more than once under one drawing.
    ///
    /// # Arguments
    /// - records: the full exploded batch
    ///
    /// # Returns
    /// - Vec<DuplicateIdentity>: empty when the batch is clean
    fn detect_duplicates(&self, records: &[ComponentRecord]) -> Vec<DuplicateIdentity>;
}
