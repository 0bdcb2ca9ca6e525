// ==========================================
// Takeoff Import API
// ==========================================
// Responsibility: wrap the import pipeline behind serializable
// request/response types for UI and CLI callers
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::auth::MembershipPolicy;
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::domain::takeoff::{ImportBatch, RowError, TargetField, UnmappedColumn};
use crate::domain::types::{ComponentType, ReferenceKind};
use crate::importer::{
    ColumnMapperImpl, ConflictHandlerImpl, CsvReader, ExploderImpl, MetadataCollectorImpl,
    RowParserImpl, TakeoffImporter, TakeoffImporterImpl,
};
use crate::repository::{TakeoffImportRepository, TakeoffImportRepositoryImpl};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Import API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// Batch UUID for this attempt
    pub batch_id: String,
    /// Data rows found in the source file
    pub total_rows: usize,
    /// Rows that passed validation
    pub valid_rows: usize,
    /// Rows rejected during parsing
    pub error_rows: usize,
    /// Drawings inserted
    pub drawings_created: usize,
    /// Drawings that already existed
    pub drawings_updated: usize,
    /// Component unit records written
    pub components_inserted: usize,
    /// Insert counts per component type
    pub components_by_type: BTreeMap<ComponentType, usize>,
    /// Reference rows created, per kind
    pub metadata_created: BTreeMap<ReferenceKind, usize>,
    /// Reference rows reused, per kind
    pub metadata_reused: BTreeMap<ReferenceKind, usize>,
    /// Per-row failures, ascending row order
    pub row_errors: Vec<RowError>,
    /// Wall time of the attempt, milliseconds
    pub elapsed_ms: i64,
}

/// One mapped column in a preview response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedColumnView {
    /// 0-based column index in the source file
    pub source_index: usize,
    /// Header cell exactly as read
    pub source_header: String,
    /// Canonical field it maps to
    pub field: TargetField,
    /// Tier that produced the match
    pub confidence: String,
}

/// Mapping preview response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingPreviewResponse {
    /// Matched source columns
    pub mappings: Vec<MappedColumnView>,
    /// Required fields no header matched
    pub missing_required: Vec<TargetField>,
    /// Source columns left over
    pub unmapped: Vec<UnmappedColumn>,
    /// Whether an import of this file would proceed past mapping
    pub is_complete: bool,
}

/// Batch list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchListResponse {
    /// Audit rows, newest first
    pub batches: Vec<ImportBatch>,
    /// Number of rows returned
    pub total: usize,
}

/// Takeoff import API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// Create a new ImportApi instance
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// Import a takeoff file into a project.
    ///
    /// # Arguments
    /// - project_id: target project
    /// - user_id: acting user, checked against project membership
    /// - file_path: CSV file path
    ///
    /// # Returns
    /// - Ok(ImportApiResponse): commit summary
    /// - Err(ApiError): error message
    pub async fn import_takeoff(
        &self,
        project_id: &str,
        user_id: &str,
        file_path: &str,
    ) -> ApiResult<ImportApiResponse> {
        let importer = self.create_importer()?;

        let result = importer.import_file(project_id, user_id, file_path).await?;

        Ok(ImportApiResponse {
            batch_id: result.batch_id,
            total_rows: result.total_rows,
            valid_rows: result.valid_rows,
            error_rows: result.error_rows,
            drawings_created: result.drawings_created,
            drawings_updated: result.drawings_updated,
            components_inserted: result.components_inserted,
            components_by_type: result.components_by_type,
            metadata_created: result.metadata_created,
            metadata_reused: result.metadata_reused,
            row_errors: result.row_errors,
            elapsed_ms: result.elapsed_time.as_millis() as i64,
        })
    }

    /// Run the column mapper against a file without writing anything.
    ///
    /// # Arguments
    /// - file_path: CSV file path
    ///
    /// # Returns
    /// - Ok(MappingPreviewResponse): what an import would map
    /// - Err(ApiError): error message
    pub async fn preview_takeoff_mapping(
        &self,
        file_path: &str,
    ) -> ApiResult<MappingPreviewResponse> {
        let importer = self.create_importer()?;

        let mapping = importer.preview_mapping(file_path).await?;
        let is_complete = mapping.is_complete();

        Ok(MappingPreviewResponse {
            mappings: mapping
                .mappings
                .into_iter()
                .map(|m| MappedColumnView {
                    source_index: m.source_index,
                    source_header: m.source_header,
                    field: m.field,
                    confidence: m.confidence.to_string(),
                })
                .collect(),
            missing_required: mapping.missing_required,
            unmapped: mapping.unmapped,
            is_complete,
        })
    }

    /// List the most recent import batches of a project.
    ///
    /// # Arguments
    /// - project_id: owning project
    /// - limit: rows per page, clamped to 1..=100
    ///
    /// # Returns
    /// - Ok(BatchListResponse): audit rows, newest first
    /// - Err(ApiError): error message
    pub async fn list_recent_batches(
        &self,
        project_id: &str,
        limit: usize,
    ) -> ApiResult<BatchListResponse> {
        let repo = TakeoffImportRepositoryImpl::new(&self.db_path)?;

        let limit = limit.clamp(1, 100);
        let batches = repo.get_recent_batches(project_id, limit).await?;
        let total = batches.len();

        Ok(BatchListResponse { batches, total })
    }

    /// Fetch one import batch audit row.
    ///
    /// # Arguments
    /// - batch_id: batch UUID
    ///
    /// # Returns
    /// - Ok(ImportBatch): the audit row
    /// - Err(ApiError::NotFound): no such batch
    pub async fn get_batch(&self, batch_id: &str) -> ApiResult<ImportBatch> {
        let repo = TakeoffImportRepositoryImpl::new(&self.db_path)?;

        repo.get_batch(batch_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("import batch does not exist: {}", batch_id)))
    }

    /// Assemble the import pipeline over one shared connection.
    fn create_importer(
        &self,
    ) -> ApiResult<TakeoffImporterImpl<TakeoffImportRepositoryImpl, ConfigManager>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let import_repo = TakeoffImportRepositoryImpl::from_connection(conn.clone());
        let config = ConfigManager::from_connection(conn.clone())?;
        let access_policy = Box::new(MembershipPolicy::from_connection(conn));

        Ok(TakeoffImporterImpl::new(
            import_repo,
            config,
            access_policy,
            Box::new(CsvReader),
            Box::new(ColumnMapperImpl),
            Box::new(RowParserImpl),
            Box::new(ExploderImpl),
            Box::new(MetadataCollectorImpl),
            Box::new(ConflictHandlerImpl),
        ))
    }
}
