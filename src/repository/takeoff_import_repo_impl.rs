// ==========================================
// SiteTrak - Takeoff Import Repository (SQLite)
// ==========================================
// Responsibility: persistence for the takeoff import pipeline
// Red line: no mapping/explosion/validation logic here; the importer
// layer hands this module a fully validated commit payload
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::takeoff::{
    CommitOutcome, ComponentRecord, Drawing, ImportBatch, ImportCommit, MetadataReference,
};
use crate::domain::types::ReferenceKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::takeoff_import_repo::TakeoffImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Columns written per component row (keep in sync with the INSERT below).
const COMPONENT_INSERT_COLUMNS: usize = 13;

// ==========================================
// TakeoffImportRepositoryImpl
// ==========================================
pub struct TakeoffImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl TakeoffImportRepositoryImpl {
    /// Create a repository instance over its own connection.
    ///
    /// # Arguments
    /// - db_path: database file path
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a repository instance sharing an existing connection.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Acquire the database connection.
    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Upsert one kind of reference rows inside the transaction.
    ///
    /// INSERT OR IGNORE with a fresh candidate id, then read the id that
    /// actually landed. A name inserted by a concurrent import between
    /// discovery and this transaction resolves to that row's id, so the
    /// returned map is always accurate.
    ///
    /// # Returns
    /// - Ok((name -> id, created, reused))
    fn upsert_references_tx(
        tx: &Transaction,
        project_id: &str,
        kind: ReferenceKind,
        references: &[MetadataReference],
        now: &str,
    ) -> RepositoryResult<(HashMap<String, String>, usize, usize)> {
        let insert_sql = format!(
            "INSERT OR IGNORE INTO {} ({}, project_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            kind.table(),
            kind.id_column(),
        );
        let select_sql = format!(
            "SELECT {} FROM {} WHERE project_id = ?1 AND name = ?2",
            kind.id_column(),
            kind.table(),
        );

        let mut insert_stmt = tx.prepare(&insert_sql)?;
        let mut select_stmt = tx.prepare(&select_sql)?;

        let mut ids = HashMap::with_capacity(references.len());
        let mut created = 0;
        let mut reused = 0;

        for reference in references {
            let candidate_id = Uuid::new_v4().to_string();
            let inserted =
                insert_stmt.execute(params![candidate_id, project_id, reference.name, now])?;
            if inserted == 1 {
                created += 1;
            } else {
                reused += 1;
            }

            let actual_id: String =
                select_stmt.query_row(params![project_id, reference.name], |row| row.get(0))?;
            ids.insert(reference.name.clone(), actual_id);
        }

        Ok((ids, created, reused))
    }

    /// Insert or touch one drawing inside the transaction.
    ///
    /// # Returns
    /// - Ok((drawing_id, true)) when the drawing was created
    /// - Ok((drawing_id, false)) when it already existed
    fn upsert_drawing_tx(
        tx: &Transaction,
        project_id: &str,
        drawing_no: &str,
        batch_id: &str,
        now: &str,
    ) -> RepositoryResult<(String, bool)> {
        let existing: Option<String> = tx
            .query_row(
                "SELECT drawing_id FROM drawing WHERE project_id = ?1 AND drawing_no = ?2",
                params![project_id, drawing_no],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(drawing_id) => {
                tx.execute(
                    "UPDATE drawing SET last_import_batch_id = ?1, updated_at = ?2 WHERE drawing_id = ?3",
                    params![batch_id, now, drawing_id],
                )?;
                Ok((drawing_id, false))
            }
            None => {
                let drawing_id = Uuid::new_v4().to_string();
                tx.execute(
                    r#"
                    INSERT INTO drawing (
                        drawing_id, project_id, drawing_no,
                        last_import_batch_id, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![drawing_id, project_id, drawing_no, batch_id, now, now],
                )?;
                Ok((drawing_id, true))
            }
        }
    }

    /// Insert component rows in chunks of `insert_batch_size` using
    /// multi-row VALUES statements.
    fn insert_components_tx(
        tx: &Transaction,
        components: &[ComponentRecord],
        drawing_ids: &HashMap<String, String>,
        reference_ids: &[HashMap<String, String>; 3],
        batch_id: &str,
        now: &str,
        insert_batch_size: usize,
    ) -> RepositoryResult<usize> {
        let chunk_size = insert_batch_size.max(1);
        let total_chunks = components.len().div_ceil(chunk_size);
        let mut inserted = 0;

        for (chunk_no, chunk) in components.chunks(chunk_size).enumerate() {
            let row_placeholder = format!(
                "({})",
                vec!["?"; COMPONENT_INSERT_COLUMNS].join(", ")
            );
            let values_clause = vec![row_placeholder.as_str(); chunk.len()].join(",\n                ");
            let sql = format!(
                r#"
                INSERT INTO component (
                    component_id, drawing_id, component_type, size_token,
                    commodity_code, seq, area_id, system_id, test_package_id,
                    attributes_json, import_batch_id, source_row, created_at
                ) VALUES
                {}
                "#,
                values_clause
            );

            let mut bind: Vec<Value> = Vec::with_capacity(chunk.len() * COMPONENT_INSERT_COLUMNS);
            for record in chunk {
                let drawing_id = drawing_ids.get(&record.drawing_no).ok_or_else(|| {
                    RepositoryError::InternalError(format!(
                        "drawing {} missing from the upserted set",
                        record.drawing_no
                    ))
                })?;
                let area_id = Self::resolve_reference_id(reference_ids, ReferenceKind::Area, record.area.as_deref());
                let system_id =
                    Self::resolve_reference_id(reference_ids, ReferenceKind::System, record.system.as_deref());
                let test_package_id = Self::resolve_reference_id(
                    reference_ids,
                    ReferenceKind::TestPackage,
                    record.test_package.as_deref(),
                );
                let attributes_json = serde_json::to_string(&record.attributes)?;

                bind.push(Value::from(record.component_id.clone()));
                bind.push(Value::from(drawing_id.clone()));
                bind.push(Value::from(record.component_type.as_str().to_string()));
                bind.push(Value::from(record.size_token.clone()));
                bind.push(Value::from(record.commodity_code.clone()));
                bind.push(Value::from(record.sequence.map(|seq| seq as i64)));
                bind.push(Value::from(area_id));
                bind.push(Value::from(system_id));
                bind.push(Value::from(test_package_id));
                bind.push(Value::from(attributes_json));
                bind.push(Value::from(batch_id.to_string()));
                bind.push(Value::from(record.source_row as i64));
                bind.push(Value::from(now.to_string()));
            }

            inserted += tx.execute(&sql, params_from_iter(bind))?;
            debug!(
                chunk = chunk_no + 1,
                chunks = total_chunks,
                rows = chunk.len(),
                "component chunk inserted"
            );
        }

        Ok(inserted)
    }

    /// Look up the id a component's reference name resolved to.
    fn resolve_reference_id(
        reference_ids: &[HashMap<String, String>; 3],
        kind: ReferenceKind,
        name: Option<&str>,
    ) -> Option<String> {
        let slot = ReferenceKind::ALL.iter().position(|k| *k == kind)?;
        name.map(str::trim)
            .filter(|n| !n.is_empty())
            .and_then(|n| reference_ids[slot].get(n))
            .cloned()
    }

    /// Write the batch audit row inside the transaction.
    fn insert_batch_tx(tx: &Transaction, batch: &ImportBatch) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, project_id, file_name,
                total_rows, success_rows, error_rows,
                components_inserted, drawings_created, drawings_updated,
                imported_at, imported_by, elapsed_ms, error_report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                batch.batch_id,
                batch.project_id,
                batch.file_name,
                batch.total_rows,
                batch.success_rows,
                batch.error_rows,
                batch.components_inserted,
                batch.drawings_created,
                batch.drawings_updated,
                batch.imported_at.map(|dt| dt.to_rfc3339()),
                batch.imported_by,
                batch.elapsed_ms,
                batch.error_report_json,
            ],
        )?;

        Ok(())
    }

    fn map_batch_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImportBatch> {
        Ok(ImportBatch {
            batch_id: row.get(0)?,
            project_id: row.get(1)?,
            file_name: row.get(2)?,
            total_rows: row.get(3)?,
            success_rows: row.get(4)?,
            error_rows: row.get(5)?,
            components_inserted: row.get(6)?,
            drawings_created: row.get(7)?,
            drawings_updated: row.get(8)?,
            imported_at: row
                .get::<_, Option<String>>(9)?
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc)),
            imported_by: row.get(10)?,
            elapsed_ms: row.get(11)?,
            error_report_json: row.get(12)?,
        })
    }
}

const BATCH_SELECT_COLUMNS: &str = r#"
    batch_id, project_id, file_name,
    total_rows, success_rows, error_rows,
    components_inserted, drawings_created, drawings_updated,
    imported_at, imported_by, elapsed_ms, error_report_json
"#;

#[async_trait]
impl TakeoffImportRepository for TakeoffImportRepositoryImpl {
    async fn find_reference_ids(
        &self,
        project_id: &str,
        kind: ReferenceKind,
        names: &[String],
    ) -> RepositoryResult<HashMap<String, String>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.get_conn()?;

        let placeholders = names.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT name, {} FROM {} WHERE project_id = ? AND name IN ({})",
            kind.id_column(),
            kind.table(),
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;

        let mut bind: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(names.len() + 1);
        bind.push(&project_id);
        for name in names {
            bind.push(name);
        }

        let ids = stmt
            .query_map(bind.as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(ids)
    }

    async fn project_exists(&self, project_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM project WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    async fn commit_import(
        &self,
        commit: &ImportCommit,
        insert_batch_size: usize,
    ) -> RepositoryResult<CommitOutcome> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let mut outcome = CommitOutcome::default();

        // References first so component rows can point at their ids.
        let mut reference_ids: [HashMap<String, String>; 3] = Default::default();
        for (slot, kind) in ReferenceKind::ALL.iter().enumerate() {
            let planned = commit.metadata.names_for(*kind);
            if planned.is_empty() {
                continue;
            }
            let (ids, created, reused) =
                Self::upsert_references_tx(&tx, &commit.project_id, *kind, planned, &now_str)?;
            debug!(kind = %kind, created, reused, "references upserted");
            reference_ids[slot] = ids;
            outcome.metadata_created.insert(*kind, created);
            outcome.metadata_reused.insert(*kind, reused);
        }

        // Drawings next; components reference them by id.
        let mut drawing_ids = HashMap::with_capacity(commit.drawing_nos.len());
        for drawing_no in &commit.drawing_nos {
            let (drawing_id, was_created) = Self::upsert_drawing_tx(
                &tx,
                &commit.project_id,
                drawing_no,
                &commit.batch_id,
                &now_str,
            )?;
            if was_created {
                outcome.drawings_created += 1;
            } else {
                outcome.drawings_updated += 1;
            }
            drawing_ids.insert(drawing_no.clone(), drawing_id);
        }

        outcome.components_inserted = Self::insert_components_tx(
            &tx,
            &commit.components,
            &drawing_ids,
            &reference_ids,
            &commit.batch_id,
            &now_str,
            insert_batch_size,
        )?;

        // Audit row last, inside the same transaction: a rolled back import
        // leaves no batch row behind.
        let error_report_json = if commit.row_errors.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&commit.row_errors)?)
        };
        let batch = ImportBatch {
            batch_id: commit.batch_id.clone(),
            project_id: commit.project_id.clone(),
            file_name: commit.file_name.clone(),
            total_rows: commit.total_rows as i32,
            success_rows: (commit.total_rows - commit.error_rows) as i32,
            error_rows: commit.error_rows as i32,
            components_inserted: outcome.components_inserted as i32,
            drawings_created: outcome.drawings_created as i32,
            drawings_updated: outcome.drawings_updated as i32,
            imported_at: Some(now),
            imported_by: commit.imported_by.clone(),
            elapsed_ms: Some(commit.elapsed_ms as i32),
            error_report_json,
        };
        Self::insert_batch_tx(&tx, &batch)?;

        tx.commit()?;

        Ok(outcome)
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM import_batch WHERE batch_id = ?1",
            BATCH_SELECT_COLUMNS
        );
        let batch = conn
            .query_row(&sql, params![batch_id], Self::map_batch_row)
            .optional()?;

        Ok(batch)
    }

    async fn get_recent_batches(
        &self,
        project_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM import_batch WHERE project_id = ?1 ORDER BY imported_at DESC LIMIT ?2",
            BATCH_SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let batches = stmt
            .query_map(params![project_id, limit], Self::map_batch_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }

    async fn find_drawing(
        &self,
        project_id: &str,
        drawing_no: &str,
    ) -> RepositoryResult<Option<Drawing>> {
        let conn = self.get_conn()?;

        let drawing = conn
            .query_row(
                r#"
                SELECT drawing_id, project_id, drawing_no,
                       last_import_batch_id, created_at, updated_at
                FROM drawing
                WHERE project_id = ?1 AND drawing_no = ?2
                "#,
                params![project_id, drawing_no],
                |row| {
                    Ok(Drawing {
                        drawing_id: row.get(0)?,
                        project_id: row.get(1)?,
                        drawing_no: row.get(2)?,
                        last_import_batch_id: row.get(3)?,
                        created_at: chrono::DateTime::parse_from_rfc3339(
                            &row.get::<_, String>(4)?,
                        )
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                        .unwrap_or_else(|_| chrono::Utc::now()),
                        updated_at: chrono::DateTime::parse_from_rfc3339(
                            &row.get::<_, String>(5)?,
                        )
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                        .unwrap_or_else(|_| chrono::Utc::now()),
                    })
                },
            )
            .optional()?;

        Ok(drawing)
    }

    async fn count_components(&self, project_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM component c
            JOIN drawing d ON d.drawing_id = c.drawing_id
            WHERE d.project_id = ?1
            "#,
            params![project_id],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    async fn count_references(
        &self,
        project_id: &str,
        kind: ReferenceKind,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE project_id = ?1",
            kind.table()
        );
        let count: i64 = conn.query_row(&sql, params![project_id], |row| row.get(0))?;

        Ok(count as usize)
    }
}
