// ==========================================
// SiteTrak - Takeoff Importer Implementation
// ==========================================
// Responsibility: run the import pipeline end to end, file to database
// Flow: read -> map -> parse -> explode -> discover -> precheck -> commit
// ==========================================

use crate::auth::AccessPolicy;
use crate::config::ImportConfigReader;
use crate::domain::takeoff::{
    ImportCommit, MappingResult, MetadataPlan, ParsedRow, ReferenceState, RowError,
};
use crate::domain::types::ReferenceKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_reader::RawTable;
use crate::importer::takeoff_importer_trait::{
    ColumnMapper as ColumnMapperTrait, ConflictHandler as ConflictHandlerTrait,
    Exploder as ExploderTrait, FileReader, MetadataCollector as MetadataCollectorTrait,
    RowParser as RowParserTrait, TakeoffImporter,
};
use crate::repository::TakeoffImportRepository;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// TakeoffImporterImpl
// ==========================================
pub struct TakeoffImporterImpl<R, C>
where
    R: TakeoffImportRepository,
    C: ImportConfigReader,
{
    // Data access layer
    import_repo: R,

    // Configuration reader
    config: C,

    // Authorization collaborator
    access_policy: Box<dyn AccessPolicy>,

    // Pipeline components
    file_reader: Box<dyn FileReader>,
    column_mapper: Box<dyn ColumnMapperTrait>,
    row_parser: Box<dyn RowParserTrait>,
    exploder: Box<dyn ExploderTrait>,
    metadata_collector: Box<dyn MetadataCollectorTrait>,
    conflict_handler: Box<dyn ConflictHandlerTrait>,
}

impl<R, C> TakeoffImporterImpl<R, C>
where
    R: TakeoffImportRepository,
    C: ImportConfigReader,
{
    /// Create a new TakeoffImporter instance.
    ///
    /// # Arguments
    /// - import_repo: import data repository
    /// - config: configuration reader
    /// - access_policy: authorization collaborator
    /// - file_reader: file reading stage
    /// - column_mapper: header mapping stage
    /// - row_parser: row validation stage
    /// - exploder: quantity explosion stage
    /// - metadata_collector: reference collection stage
    /// - conflict_handler: duplicate identity detection
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        import_repo: R,
        config: C,
        access_policy: Box<dyn AccessPolicy>,
        file_reader: Box<dyn FileReader>,
        column_mapper: Box<dyn ColumnMapperTrait>,
        row_parser: Box<dyn RowParserTrait>,
        exploder: Box<dyn ExploderTrait>,
        metadata_collector: Box<dyn MetadataCollectorTrait>,
        conflict_handler: Box<dyn ConflictHandlerTrait>,
    ) -> Self {
        Self {
            import_repo,
            config,
            access_policy,
            file_reader,
            column_mapper,
            row_parser,
            exploder,
            metadata_collector,
            conflict_handler,
        }
    }
}

#[async_trait::async_trait]
impl<R, C> TakeoffImporter for TakeoffImporterImpl<R, C>
where
    R: TakeoffImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        project_id: &str,
        user_id: &str,
        file_path: P,
    ) -> ImportResult<crate::domain::takeoff::ImportResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        let file_path_str = file_path.as_ref().to_str().unwrap_or("unknown");
        let file_name = Path::new(file_path_str)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        info!(
            batch_id = %batch_id,
            project = %project_id,
            file = %file_path_str,
            "takeoff import started"
        );

        // === Step 1: read file ===
        debug!("step 1: read file");
        let table = self.file_reader.read_table(file_path.as_ref())?;
        info!(
            columns = table.headers.len(),
            rows = table.rows.len(),
            "file read"
        );

        // === Step 2: map columns ===
        debug!("step 2: map columns");
        let extra_synonyms = self.config.get_header_synonyms().await?;
        let mapping = self.column_mapper.map_headers(&table.headers, &extra_synonyms);
        if !mapping.is_complete() {
            error!(missing = ?mapping.missing_required, "required columns not found");
            return Err(ImportError::MissingRequiredColumns(mapping.missing_required));
        }
        info!(
            mapped = mapping.mappings.len(),
            unmapped = mapping.unmapped.len(),
            "columns mapped"
        );

        // === Step 3: parse rows ===
        debug!("step 3: parse rows");
        let total_rows = table.rows.len();
        let (rows, row_errors, error_row_count) = self.parse_rows(&table, &mapping);
        info!(
            valid = rows.len(),
            failed = error_row_count,
            "rows parsed"
        );

        self.finish_import(
            project_id,
            user_id,
            batch_id,
            Some(file_name),
            total_rows,
            error_row_count,
            rows,
            row_errors,
            start_time,
        )
        .await
    }

    #[instrument(skip(self, rows), fields(batch_id))]
    async fn import_rows(
        &self,
        project_id: &str,
        user_id: &str,
        rows: Vec<ParsedRow>,
        file_name: Option<String>,
    ) -> ImportResult<crate::domain::takeoff::ImportResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let total_rows = rows.len();

        info!(
            batch_id = %batch_id,
            project = %project_id,
            rows = total_rows,
            "takeoff import started from pre-parsed rows"
        );

        self.finish_import(
            project_id,
            user_id,
            batch_id,
            file_name,
            total_rows,
            0,
            rows,
            Vec::new(),
            start_time,
        )
        .await
    }

    async fn preview_mapping<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<MappingResult> {
        let file_path_str = file_path.as_ref().to_str().unwrap_or("unknown");
        debug!(file = %file_path_str, "mapping preview requested");

        let table = self.file_reader.read_table(file_path.as_ref())?;
        let extra_synonyms = self.config.get_header_synonyms().await?;
        let mapping = self.column_mapper.map_headers(&table.headers, &extra_synonyms);

        info!(
            file = %file_path_str,
            mapped = mapping.mappings.len(),
            missing = mapping.missing_required.len(),
            unmapped = mapping.unmapped.len(),
            "mapping preview built"
        );

        Ok(mapping)
    }

    async fn import_files<P: AsRef<Path> + Send + Sync>(
        &self,
        project_id: &str,
        user_id: &str,
        file_paths: Vec<P>,
    ) -> ImportResult<Vec<Result<crate::domain::takeoff::ImportResult, ImportError>>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "multi-file import started");

        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().to_str().unwrap_or("unknown").to_string();
            async move {
                match self.import_file(project_id, user_id, path).await {
                    Ok(result) => {
                        info!(
                            file = %path_str,
                            components = result.components_inserted,
                            "file import finished"
                        );
                        Ok(result)
                    }
                    Err(e) => {
                        error!(file = %path_str, error = %e, "file import failed");
                        Err(e)
                    }
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "multi-file import finished"
        );

        Ok(results)
    }
}

// Helper methods
impl<R, C> TakeoffImporterImpl<R, C>
where
    R: TakeoffImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    /// Parse every raw row, accumulating errors instead of aborting.
    ///
    /// # Returns
    /// - (valid rows, all row errors, count of rows with at least one error)
    fn parse_rows(
        &self,
        table: &RawTable,
        mapping: &MappingResult,
    ) -> (Vec<ParsedRow>, Vec<RowError>, usize) {
        let mut rows = Vec::new();
        let mut row_errors = Vec::new();
        let mut error_row_count = 0;

        for raw in &table.rows {
            match self.row_parser.parse_row(raw, mapping) {
                Ok(row) => rows.push(row),
                Err(errors) => {
                    for err in &errors {
                        warn!(
                            row = err.row_number,
                            column = ?err.column,
                            message = %err.message,
                            "row rejected"
                        );
                    }
                    row_errors.extend(errors);
                    error_row_count += 1;
                }
            }
        }

        (rows, row_errors, error_row_count)
    }

    /// Stages 4-8: explode, collect and discover metadata, check the commit
    /// preconditions, then persist everything in one transaction.
    #[allow(clippy::too_many_arguments)]
    async fn finish_import(
        &self,
        project_id: &str,
        user_id: &str,
        batch_id: String,
        file_name: Option<String>,
        total_rows: usize,
        error_row_count: usize,
        rows: Vec<ParsedRow>,
        row_errors: Vec<RowError>,
        start_time: Instant,
    ) -> ImportResult<crate::domain::takeoff::ImportResult> {
        // === Step 4: explode quantities ===
        debug!("step 4: explode quantities");
        let components = self.exploder.explode(&rows);
        info!(
            rows = rows.len(),
            components = components.len(),
            "quantities exploded"
        );

        // === Step 5: collect metadata references ===
        debug!("step 5: collect metadata references");
        let mut metadata = self.metadata_collector.collect(&rows);

        // === Step 6: discover existing references ===
        debug!("step 6: discover existing references");
        self.discover_references(project_id, &mut metadata).await?;

        // === Step 7: preconditions ===
        debug!("step 7: check preconditions");
        let drawing_nos = Self::distinct_drawings(&rows);
        let valid_rows = rows.len();
        let commit = ImportCommit {
            batch_id,
            project_id: project_id.to_string(),
            file_name,
            imported_by: Some(user_id.to_string()),
            drawing_nos,
            components,
            metadata,
            total_rows,
            error_rows: error_row_count,
            row_errors,
            elapsed_ms: start_time.elapsed().as_millis() as i64,
        };
        self.check_preconditions(user_id, &commit).await?;

        // No row survived parsing: succeed with zero counts, write nothing.
        if valid_rows == 0 {
            info!(
                batch_id = %commit.batch_id,
                total = total_rows,
                failed = error_row_count,
                "no valid rows, nothing to commit"
            );
            return Ok(Self::empty_result(commit, start_time.elapsed()));
        }

        // === Step 8: commit transaction ===
        debug!("step 8: commit transaction");
        let insert_batch_size = self.config.get_insert_batch_size().await?;
        let outcome = self
            .import_repo
            .commit_import(&commit, insert_batch_size)
            .await?;
        let elapsed_time = start_time.elapsed();

        let mut components_by_type = BTreeMap::new();
        for record in &commit.components {
            *components_by_type.entry(record.component_type).or_insert(0) += 1;
        }

        info!(
            batch_id = %commit.batch_id,
            total = total_rows,
            components = outcome.components_inserted,
            drawings_created = outcome.drawings_created,
            drawings_updated = outcome.drawings_updated,
            elapsed_ms = elapsed_time.as_millis(),
            "takeoff import committed"
        );

        Ok(crate::domain::takeoff::ImportResult {
            batch_id: commit.batch_id,
            project_id: commit.project_id,
            file_name: commit.file_name,
            total_rows,
            valid_rows,
            error_rows: error_row_count,
            drawings_created: outcome.drawings_created,
            drawings_updated: outcome.drawings_updated,
            components_inserted: outcome.components_inserted,
            components_by_type,
            metadata_created: outcome.metadata_created,
            metadata_reused: outcome.metadata_reused,
            row_errors: commit.row_errors,
            elapsed_time,
        })
    }

    /// Fill in the existence state of every collected reference name, one
    /// batched lookup per kind. Kinds with no names issue no query.
    async fn discover_references(
        &self,
        project_id: &str,
        metadata: &mut MetadataPlan,
    ) -> ImportResult<()> {
        for kind in ReferenceKind::ALL {
            let names: Vec<String> = metadata
                .names_for(kind)
                .iter()
                .map(|r| r.name.clone())
                .collect();
            if names.is_empty() {
                continue;
            }

            let existing = self
                .import_repo
                .find_reference_ids(project_id, kind, &names)
                .await?;
            for reference in metadata.names_for_mut(kind) {
                if let Some(record_id) = existing.get(&reference.name) {
                    reference.state = ReferenceState::Exists {
                        record_id: record_id.clone(),
                    };
                }
            }

            debug!(
                kind = %kind,
                total = names.len(),
                existing = existing.len(),
                missing = metadata.missing_count(kind),
                "references discovered"
            );
        }

        Ok(())
    }

    /// Preconditions, in order: payload ceiling, tenancy, duplicate ids.
    /// All of them run before any write.
    async fn check_preconditions(&self, user_id: &str, commit: &ImportCommit) -> ImportResult<()> {
        // 1. Payload ceiling, measured on the serialized commit
        let payload_size = serde_json::to_vec(commit)?.len();
        let limit = self.config.get_max_payload_bytes().await?;
        if payload_size > limit {
            error!(size = payload_size, limit, "commit payload over the ceiling");
            return Err(ImportError::PayloadTooLarge {
                size: payload_size,
                limit,
            });
        }

        // 2. Tenancy: the project must exist and the user must hold import
        //    rights on it
        if !self.import_repo.project_exists(&commit.project_id).await? {
            error!(project = %commit.project_id, "target project does not exist");
            return Err(ImportError::ProjectNotFound(commit.project_id.clone()));
        }
        if !self
            .access_policy
            .can_import(user_id, &commit.project_id)
            .await?
        {
            warn!(
                user = %user_id,
                project = %commit.project_id,
                "import not authorized"
            );
            return Err(ImportError::Unauthorized {
                user_id: user_id.to_string(),
                project_id: commit.project_id.clone(),
            });
        }

        // 3. Duplicate component ids within the batch
        let duplicates = self.conflict_handler.detect_duplicates(&commit.components);
        if !duplicates.is_empty() {
            error!(
                count = duplicates.len(),
                "duplicate component ids in batch"
            );
            return Err(ImportError::DuplicateIdentity { duplicates });
        }

        Ok(())
    }

    /// Distinct drawing numbers across the valid rows, first-seen order.
    fn distinct_drawings(rows: &[ParsedRow]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut drawings = Vec::new();
        for row in rows {
            if seen.insert(row.drawing_no.clone()) {
                drawings.push(row.drawing_no.clone());
            }
        }
        drawings
    }

    /// Zero-count result for an import where nothing reached the database.
    fn empty_result(
        commit: ImportCommit,
        elapsed_time: Duration,
    ) -> crate::domain::takeoff::ImportResult {
        crate::domain::takeoff::ImportResult {
            batch_id: commit.batch_id,
            project_id: commit.project_id,
            file_name: commit.file_name,
            total_rows: commit.total_rows,
            valid_rows: 0,
            error_rows: commit.error_rows,
            drawings_created: 0,
            drawings_updated: 0,
            components_inserted: 0,
            components_by_type: BTreeMap::new(),
            metadata_created: BTreeMap::new(),
            metadata_reused: BTreeMap::new(),
            row_errors: commit.row_errors,
            elapsed_time,
        }
    }
}
